//! Cross-origin checks applied to fetched responses.
//! Spec: <https://fetch.spec.whatwg.org/#cors-check>

use url::Url;

use crate::error::LoadError;
use crate::request::{CorsSetting, OriginBehavior, ResourceRequest, Response};

/// Whether `target` is on another origin than `initiator`.
///
/// Opaque origins (`file:`, `data:`) never compare equal, so for those only the
/// scheme is compared.
pub fn is_cross_origin(initiator: &Url, target: &Url) -> bool {
    let origin = initiator.origin();
    if !origin.is_tuple() {
        return initiator.scheme() != target.scheme();
    }
    origin != target.origin()
}

/// Validate `response` for `request` under the given CORS mode.
///
/// Same-origin responses pass untouched. A cross-origin response fetched without
/// CORS is tainted or rejected depending on `behavior`; one fetched with CORS must
/// carry matching `Access-Control-Allow-*` headers.
pub fn check_response(
    request: &ResourceRequest,
    mut response: Response,
    cors: CorsSetting,
    behavior: OriginBehavior,
) -> Result<Response, LoadError> {
    let Some(initiator) = request.initiator.as_ref() else {
        return Ok(response);
    };
    if !is_cross_origin(initiator, &response.url) {
        return Ok(response);
    }
    let rejected = || LoadError::CorsRejected {
        url: response.url.clone(),
    };
    match cors {
        CorsSetting::None => match behavior {
            OriginBehavior::Taint => {
                response.tainted = true;
                Ok(response)
            }
            OriginBehavior::Fail => Err(rejected()),
        },
        CorsSetting::Anonymous | CorsSetting::UseCredentials => {
            if passes_cors_check(initiator, &response, cors) {
                Ok(response)
            } else {
                Err(rejected())
            }
        }
    }
}

/// Spec: Section 4.9 - CORS check
fn passes_cors_check(initiator: &Url, response: &Response, cors: CorsSetting) -> bool {
    let origin = initiator.origin().ascii_serialization();
    let Some(allowed) = response.header("access-control-allow-origin").map(str::trim) else {
        return false;
    };
    match cors {
        CorsSetting::None => true,
        CorsSetting::Anonymous => allowed == "*" || allowed == origin,
        CorsSetting::UseCredentials => {
            allowed == origin
                && response
                    .header("access-control-allow-credentials")
                    .is_some_and(|value| value.trim() == "true")
        }
    }
}
