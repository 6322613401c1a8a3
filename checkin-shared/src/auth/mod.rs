/// Credentials for staff accounts
///
/// Logging in is disabled in the web app, but staff accounts still keep a
/// password hash so that sign-in can be switched back on without
/// re-creating users.
///
/// - [`password`]: Argon2id hashing and the minimum password length

pub mod password;
