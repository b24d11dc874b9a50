use tracing::warn;

use crate::error::{Result, RoutingError};
use crate::router::Router;

/// Check the signature of the router's request against its matched route.
///
/// Fails with [`RoutingError::InvalidSignature`] carrying no route when
/// nothing has been matched yet.
pub fn verify_signature(router: &Router) -> Result<()> {
    let Some(route) = router.matched_route() else {
        return Err(RoutingError::InvalidSignature {
            route: None,
            message: "Invalid signature as no matched route".to_owned(),
        });
    };

    let generator = router.url_generator();
    let request = router.routing_request();
    let base_url = route.base_url_for(route.params().locale.as_deref(), generator.url_base());
    if generator.has_valid_signature(route.uri(), request.uri(), base_url.as_deref()) {
        return Ok(());
    }

    warn!(
        route_uri = %route.uri(),
        request_uri = %request.uri(),
        "Signature verification failed"
    );
    Err(RoutingError::InvalidSignature {
        route: Some(Box::new(route.clone())),
        message: "Invalid signature".to_owned(),
    })
}
