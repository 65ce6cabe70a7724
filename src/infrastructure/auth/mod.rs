pub mod credentials;
pub mod middleware;
pub mod request_id;

pub use credentials::{bearer_token, client_key, LOCAL_CLIENT_KEY};
pub use middleware::{auth_middleware, AuthAccount};
pub use request_id::{request_id_middleware, RequestId};
