mod cron_auth;

pub use cron_auth::{constant_time_compare, cron_auth_middleware, CronAuthConfig};
