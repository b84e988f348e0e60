//! Built-in fact producers.
//!
//! Each module registers one or more producers with
//! [`fact_producer!`](hostfacts_engine::fact_producer). Linking this crate is
//! enough to make them visible to the registry; nothing needs to be called.
//!
//! Producers read host state on their own and share nothing. Parsing of
//! command output lives in plain functions so it can be tested on captured
//! samples.

mod admin_users;
mod command;
mod crashplan_username;
mod local_user_dirs;
mod machine_type;
mod macos_upgrade;
mod physical_or_virtual;
mod profiler;
mod security;
mod sysctl;
mod system_extensions;
mod users;
