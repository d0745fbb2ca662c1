pub mod b64;
