pub mod api_quota;
pub mod constants;
