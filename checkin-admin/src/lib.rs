//! # checkin-admin
//!
//! Command-line maintenance for the check-in database: creating the first
//! administrator and adding students without going through the web pages.
//!
//! ## Usage
//!
//! ```bash
//! checkin-admin create-admin --username maria --email maria@example.com
//! checkin-admin add-student --first-name Ana --last-name Lopez
//! ```

use anyhow::{bail, Context};
use checkin_shared::admin::{self, AddStudentOutcome};
use checkin_shared::db::pool::DEFAULT_DATABASE_URL;
use checkin_shared::models::user::User;
use checkin_shared::validation::{NewStaff, StudentForm};
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::info;

/// Check-in database administration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite connection URL
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Create a user with administrator and instructor rights
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Asked for twice when omitted, hidden on a terminal
        #[arg(long)]
        password: Option<String>,
    },

    /// Add a student unless one with the same name exists
    AddStudent {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },
}

/// Source of a password when `--password` is not given
pub trait PasswordPrompt {
    /// Shows `prompt` and reads one password
    fn read(&mut self, prompt: &str) -> anyhow::Result<String>;

    /// Whether typed characters stay off the screen
    fn hides_input(&self) -> bool;
}

/// Reads from the controlling terminal with echo turned off
#[derive(Debug, Default)]
pub struct HiddenTerminal;

impl PasswordPrompt for HiddenTerminal {
    fn read(&mut self, prompt: &str) -> anyhow::Result<String> {
        rpassword::prompt_password(prompt).context("Could not read password from terminal")
    }

    fn hides_input(&self) -> bool {
        true
    }
}

/// Reads one password per line, for piped input
///
/// Prompts go to `output`; the lines themselves are not echoed back.
#[derive(Debug)]
pub struct LinePrompt<R, W> {
    pub input: R,
    pub output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> PasswordPrompt for LinePrompt<R, W> {
    fn read(&mut self, prompt: &str) -> anyhow::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("Unexpected end of input");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn hides_input(&self) -> bool {
        false
    }
}

/// Hidden terminal prompt when stdin is a terminal, line reader otherwise
pub fn stdin_password_prompt() -> Box<dyn PasswordPrompt> {
    password_prompt_for(io::stdin().is_terminal())
}

fn password_prompt_for(interactive: bool) -> Box<dyn PasswordPrompt> {
    if interactive {
        Box::new(HiddenTerminal)
    } else {
        Box::new(LinePrompt::new(io::stdin().lock(), io::stderr()))
    }
}

/// Reads a password and its confirmation
pub fn read_password<P: PasswordPrompt + ?Sized>(passwords: &mut P) -> anyhow::Result<String> {
    let password = passwords.read("Password: ")?;
    let confirm = passwords.read("Confirm password: ")?;

    if password != confirm {
        bail!("Passwords do not match");
    }
    Ok(password)
}

/// Creates an administrator who is also an instructor
///
/// # Errors
///
/// Fails when the username or email is taken, the password is shorter than
/// eight characters, or the database is unavailable.
pub async fn create_admin(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password: String,
) -> anyhow::Result<User> {
    let user = admin::create_staff(
        pool,
        NewStaff {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password,
            is_admin: true,
            is_instructor: true,
        },
    )
    .await
    .with_context(|| format!("Could not create admin '{}'", username))?;

    info!(user_id = user.id, "Admin user created");
    Ok(user)
}

/// Adds a student, leaving an existing student of the same name untouched
pub async fn add_student(
    pool: &SqlitePool,
    first_name: &str,
    last_name: &str,
    email: Option<String>,
    phone: Option<String>,
) -> anyhow::Result<AddStudentOutcome> {
    let form = StudentForm {
        first_name: Some(first_name.to_string()),
        last_name: Some(last_name.to_string()),
        email,
        phone,
    };

    let outcome = admin::add_student_if_absent(pool, &form)
        .await
        .with_context(|| format!("Could not add student {} {}", first_name, last_name))?;
    Ok(outcome)
}

/// Runs one command, asking `passwords` for a missing password
///
/// Returns the line to print on success.
pub async fn run<P: PasswordPrompt + ?Sized>(
    pool: &SqlitePool,
    command: Command,
    passwords: &mut P,
) -> anyhow::Result<String> {
    match command {
        Command::CreateAdmin {
            username,
            email,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => read_password(passwords)?,
            };
            let user = create_admin(pool, &username, &email, password).await?;
            Ok(format!("Admin user {} created successfully.", user.username))
        }
        Command::AddStudent {
            first_name,
            last_name,
            email,
            phone,
        } => match add_student(pool, &first_name, &last_name, email, phone).await? {
            AddStudentOutcome::Created(student) => {
                Ok(format!("Student {} added successfully.", student.full_name()))
            }
            AddStudentOutcome::AlreadyExists(student) => {
                Ok(format!("Student {} already exists.", student.full_name()))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines(input: &str) -> LinePrompt<Cursor<String>, Vec<u8>> {
        LinePrompt::new(Cursor::new(input.to_string()), Vec::new())
    }

    #[test]
    fn test_read_password_matching() {
        let mut passwords = lines("secret-pass\nsecret-pass\n");

        let password = read_password(&mut passwords).unwrap();
        assert_eq!(password, "secret-pass");
        assert_eq!(
            String::from_utf8(passwords.output).unwrap(),
            "Password: Confirm password: "
        );
    }

    #[test]
    fn test_read_password_mismatch() {
        let err = read_password(&mut lines("secret-pass\nsecret-typo\r\n")).unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn test_read_password_end_of_input() {
        assert!(read_password(&mut lines("only-once\n")).is_err());
    }

    #[test]
    fn test_terminal_prompt_hides_input() {
        assert!(password_prompt_for(true).hides_input());
        assert!(!password_prompt_for(false).hides_input());
        assert!(!lines("").hides_input());
    }

    #[test]
    fn test_parse_create_admin() {
        let cli = Cli::try_parse_from([
            "checkin-admin",
            "--database-url",
            "sqlite::memory:",
            "create-admin",
            "--username",
            "maria",
            "--email",
            "maria@example.com",
        ])
        .unwrap();

        assert_eq!(cli.database_url, "sqlite::memory:");
        assert_eq!(
            cli.command,
            Command::CreateAdmin {
                username: "maria".to_string(),
                email: "maria@example.com".to_string(),
                password: None,
            }
        );
    }

    #[test]
    fn test_parse_add_student_requires_names() {
        assert!(Cli::try_parse_from(["checkin-admin", "add-student", "--first-name", "Ana"]).is_err());
    }
}
