pub const LOGIN: &str = "/auth/login";
pub const REGISTER: &str = "/auth/register";
pub const LOGOUT: &str = "/auth/logout";
pub const REFRESH: &str = "/auth/refresh";
pub const PASSWORD_RESET_REQUEST: &str = "/auth/password-reset-request";
pub const PASSWORD_RESET: &str = "/auth/password-reset";
pub const CHANGE_PASSWORD: &str = "/auth/change-password";
pub const PRODUCTS: &str = "/productos";
pub const MOVEMENTS: &str = "/movimientos";

/// Auth endpoints that never carry a bearer credential and whose 401 answers are
/// ordinary rejections rather than a lost session.
const PUBLIC: [&str; 4] = [LOGIN, REGISTER, PASSWORD_RESET_REQUEST, PASSWORD_RESET];

#[must_use]
pub fn is_public(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let path = path.trim_end_matches('/');
    PUBLIC.contains(&path)
}

#[must_use]
pub fn product(id: &str) -> String {
    format!("{PRODUCTS}/{}", urlencoding::encode(id))
}
