pub mod cookies;
pub mod extract;
pub mod password;
pub mod tokens;
