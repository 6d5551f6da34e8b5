pub mod attendance;
pub mod holiday;
pub mod leave_request;
pub mod permission;
pub mod regularization;
pub mod reports;

#[cfg(test)]
pub mod test_support;

use actix_web::HttpRequest;

/// Address the request came from, as far as proxies tell.
pub fn client_ip(req: &HttpRequest) -> Option<String> {
    req.connection_info()
        .realip_remote_addr()
        .map(str::to_string)
}
