pub mod attachment;
pub mod email;
pub mod fallback;
pub mod health;
pub mod signup;
pub mod users;
pub mod welcome;
