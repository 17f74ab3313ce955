//! The emission planner: groups definitions by destination role, applies
//! pruning, and yields the ordered IR the code writer renders.

mod prune;

use indexmap::IndexMap;

use crate::config::Config;
use crate::error::{Error, Errors, PlanError};
use crate::translator::{OperationBinding, Translation};
use crate::typedef::{TypeDefinition, TypeOrigin, ValidationKind};

/// One logical output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Models,
    Client,
    ServerAdapter,
    ServerRouter,
    ServerService,
    ServerMain,
    McpTools,
    Responses,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Models => "models",
            Role::Client => "client",
            Role::ServerAdapter => "server-adapter",
            Role::ServerRouter => "server-router",
            Role::ServerService => "server-service",
            Role::ServerMain => "server-main",
            Role::McpTools => "mcp-tools",
            Role::Responses => "responses",
        }
    }

    /// Scaffold roles are authored once and preserved on re-runs.
    pub fn is_scaffold(self) -> bool {
        matches!(
            self,
            Role::ServerAdapter | Role::ServerService | Role::ServerMain
        )
    }
}

/// An MCP tool descriptor derived from one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct McpTool {
    pub name: String,
    pub description: Option<String>,
    pub operation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrPayload {
    Type(TypeDefinition),
    Operation(OperationBinding),
    McpTool(McpTool),
    Scaffold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrEntry {
    pub name: String,
    pub scaffold: bool,
    pub payload: IrPayload,
}

/// The planned emission: role to ordered IR entries.
#[derive(Debug, Default)]
pub struct Emission {
    bundles: IndexMap<Role, Vec<IrEntry>>,
}

impl Emission {
    pub fn role(&self, role: Role) -> &[IrEntry] {
        self.bundles.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roles(&self) -> impl Iterator<Item = (Role, &[IrEntry])> {
        self.bundles.iter().map(|(role, v)| (*role, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.values().all(Vec::is_empty)
    }

    fn insert(&mut self, role: Role, entry: IrEntry) -> Result<(), PlanError> {
        let bundle = self.bundles.entry(role).or_default();
        if bundle.iter().any(|e| e.name == entry.name) {
            return Err(PlanError::RoleConflict {
                role: role.as_str().to_string(),
                name: entry.name,
            });
        }
        bundle.push(entry);
        Ok(())
    }
}

/// Group the translation into roles, pruning unreachable types first.
pub fn plan(translation: &Translation, config: &Config) -> Result<Emission, Errors> {
    let mut errors = Errors::new();
    let retained = prune::retained_names(translation, config);
    log::debug!(
        "planning emission: {} retained of {} definitions",
        retained.len(),
        translation.tracker.iter().count()
    );

    let mut emission = Emission::default();

    if config.generate.models {
        for def in translation.tracker.iter() {
            if !retained.contains(def.name.as_str()) {
                continue;
            }
            let mut def = def.clone();
            if config.generate.validation.skip {
                def.validation = ValidationKind::None;
            }
            let role = match def.origin {
                TypeOrigin::Response { .. } => Role::Responses,
                _ => Role::Models,
            };
            let entry = IrEntry {
                name: def.name.clone(),
                scaffold: false,
                payload: IrPayload::Type(def),
            };
            if let Err(e) = emission.insert(role, entry) {
                errors.push(Error::from(e));
            }
        }
    }

    if config.generate.client {
        for op in &translation.operations {
            let entry = IrEntry {
                name: op.fn_name.clone(),
                scaffold: false,
                payload: IrPayload::Operation(op.clone()),
            };
            if let Err(e) = emission.insert(Role::Client, entry) {
                errors.push(Error::from(e));
            }
        }
    }

    if config.generate.handler.is_some() {
        for op in &translation.operations {
            for role in [Role::ServerRouter, Role::ServerService] {
                let entry = IrEntry {
                    name: op.fn_name.clone(),
                    scaffold: role.is_scaffold(),
                    payload: IrPayload::Operation(op.clone()),
                };
                if let Err(e) = emission.insert(role, entry) {
                    errors.push(Error::from(e));
                }
            }
        }
        for (role, name) in [(Role::ServerAdapter, "middleware"), (Role::ServerMain, "main")] {
            let entry = IrEntry {
                name: name.to_string(),
                scaffold: true,
                payload: IrPayload::Scaffold,
            };
            if let Err(e) = emission.insert(role, entry) {
                errors.push(Error::from(e));
            }
        }
    }

    if config
        .generate
        .mcp_server
        .as_ref()
        .is_some_and(|m| m.enabled)
    {
        for op in &translation.operations {
            let mcp = op.mcp.clone().unwrap_or_default();
            if mcp.skip {
                continue;
            }
            let name = mcp.name.unwrap_or_else(|| op.fn_name.clone());
            let entry = IrEntry {
                name: name.clone(),
                scaffold: false,
                payload: IrPayload::McpTool(McpTool {
                    name,
                    description: mcp.description,
                    operation: op.fn_name.clone(),
                }),
            };
            if let Err(e) = emission.insert(Role::McpTools, entry) {
                errors.push(Error::from(e));
            }
        }
    }

    classify_reference_errors(translation, validate(&emission), &mut errors);

    errors.into_result(emission)
}

/// Split dangling-reference violations into "this type was pruned but
/// something still points at it" (accumulated and reported together) and
/// "this name was never defined at all".
fn classify_reference_errors(
    translation: &Translation,
    violations: Vec<PlanError>,
    errors: &mut Errors,
) {
    let mut still_referenced = Vec::new();
    for violation in violations {
        match violation {
            PlanError::Emission(name)
                if translation.tracker.lookup_by_name(&name).is_some() =>
            {
                still_referenced.push(name);
            }
            other => errors.push(Error::from(other)),
        }
    }
    if !still_referenced.is_empty() {
        errors.push(Error::from(PlanError::StillReferenced(still_referenced)));
    }
}

/// Check that every referenced type exists in the bundle (external types
/// are declared by their import and need no bundle entry).
pub fn validate(emission: &Emission) -> Vec<PlanError> {
    let mut defined: Vec<&str> = Vec::new();
    for (_, entries) in emission.roles() {
        for entry in entries {
            if let IrPayload::Type(def) = &entry.payload {
                defined.push(def.name.as_str());
            }
        }
    }

    let mut errors = Vec::new();
    let models_present = !emission.role(Role::Models).is_empty()
        || !emission.role(Role::Responses).is_empty();
    if !models_present {
        return errors;
    }
    for (_, entries) in emission.roles() {
        for entry in entries {
            let referenced: Vec<&str> = match &entry.payload {
                IrPayload::Type(def) => def.referenced_names(),
                IrPayload::Operation(op) => {
                    let mut names = Vec::new();
                    for p in &op.params {
                        p.type_ref.named_refs(&mut names);
                    }
                    if let Some(body) = &op.body {
                        body.type_ref.named_refs(&mut names);
                    }
                    for r in &op.responses {
                        if let Some(t) = &r.type_ref {
                            t.named_refs(&mut names);
                        }
                    }
                    names
                }
                IrPayload::McpTool(_) | IrPayload::Scaffold => Vec::new(),
            };
            for name in referenced {
                if !defined.contains(&name) {
                    errors.push(PlanError::Emission(name.to_string()));
                }
            }
        }
    }
    errors
}
