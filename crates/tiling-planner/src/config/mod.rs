mod parser;
mod validator;

pub use parser::{
    parse_family, parse_family_str, parse_platform, parse_platform_str, parse_request,
    parse_request_str,
};
pub use validator::{validate_family, validate_platform};
