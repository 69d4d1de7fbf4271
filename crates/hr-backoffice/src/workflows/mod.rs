pub mod promotion;
pub mod recruitment;
pub mod users;
