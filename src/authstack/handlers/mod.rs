pub mod dashboard;
pub use self::dashboard::{dashboard, delete_account};

pub mod health;
pub use self::health::health;

pub mod index;
pub use self::index::index;

pub mod login;
pub use self::login::{company_form, company_login, user_form, user_login};

pub mod logout;
pub use self::logout::logout;

pub mod register;
pub use self::register::{register, register_form};

pub mod forms;
pub(crate) mod pages;
