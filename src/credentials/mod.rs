pub mod generator;

pub use generator::{extract_lastname, generate_password, generate_school_email, PASSWORD_ALPHABET};
