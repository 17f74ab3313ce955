//! The seam between generated client code and an actual HTTP stack.
//!
//! Generated clients build `http::Request` values and hand them to a
//! [`Transport`]; which HTTP implementation sits behind it is the caller's
//! choice and stays out of generated code.

/// Error surfaced by a [`Transport`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request could not be built")]
    Request(#[from] http::Error),
    #[error("i/o failure during exchange")]
    Io(#[from] std::io::Error),
    #[error("transport failure: {0}")]
    Other(String),
}

/// Synchronous request/response exchange.
pub trait Transport {
    fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // must be usable behind a boxed dyn reference in generated clients
    const _: () = {
        const fn assert_object_safe(_: &dyn Transport) {}
    };

    struct Echo;

    impl Transport for Echo {
        fn send(
            &self,
            request: http::Request<Vec<u8>>,
        ) -> Result<http::Response<Vec<u8>>, TransportError> {
            Ok(http::Response::builder()
                .status(200)
                .body(request.into_body())?)
        }
    }

    #[test]
    fn exchange_round_trips() {
        let request = http::Request::builder()
            .method(http::Method::POST)
            .uri("/echo")
            .body(b"payload".to_vec())
            .unwrap();
        let response = Echo.send(request).unwrap();
        assert_eq!(http::StatusCode::OK, response.status());
        assert_eq!(b"payload".as_ref(), response.body().as_slice());
    }
}
