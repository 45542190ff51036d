//! gitdoc - GitHub-backed document store client
//!
//! Reads and writes files in a GitHub repository through an optimistic
//! contents cache: the first read of an address fetches, later reads are
//! served from cache, and confirmed writes patch the cache in place instead
//! of refetching.

mod cache;
mod config;
mod github;
mod sync;

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cache::{Address, ContentsCache};
use config::Config;
use github::{encode, ContentsApi, GithubClient, ReauthPrompt, SessionStore};
use sync::{CommitPrompt, EditorDocument, SyncOps};

/// CLI command
#[derive(Debug)]
enum Command {
    /// Print a file's decoded content
    Cat { path: String },
    /// List a directory
    Ls { path: String },
    /// Commit a local file over an existing document
    Save { path: String, file: PathBuf },
    /// Create a new file under a directory
    Create {
        base_path: String,
        name: String,
        file: PathBuf,
    },
    /// Delete a file
    Delete { path: String },
    /// Attach a local file under <base_path>/figures
    Upload { base_path: String, file: PathBuf },
    /// Store a token for authenticated calls
    Login { token: String },
    /// Clear the stored token
    Logout,
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"gitdoc - GitHub-backed document store client

USAGE:
    gitdoc cat <path>
    gitdoc ls <path>
    gitdoc save <path> <local-file>
    gitdoc create <base-path> <name> <local-file>
    gitdoc delete <path>
    gitdoc upload <base-path> <local-file>
    gitdoc login <token>
    gitdoc logout

COMMANDS:
    cat     Print the decoded content of a repository file
    ls      List a repository directory
    save    Commit a local file over an existing repository file
    create  Create a new repository file under a directory
    delete  Delete a repository file
    upload  Attach a local file under <base-path>/figures
    login   Store a GitHub token (valid 7 days)
    logout  Clear the stored token
    help    Show this help message

EXAMPLES:
    # List the topics directory
    gitdoc ls topics

    # Commit local edits over topics/question.md
    gitdoc save topics/question.md ./question.md

    # Attach an image to the topics document
    gitdoc upload topics ./diagram.png

ENVIRONMENT:
    GITDOC_OWNER      Repository owner (required)
    GITDOC_REPO       Repository name (required)
    GITDOC_BRANCH     Branch to read and write (default: master)
    GITDOC_CLIENT_ID  OAuth client id used in the re-login URL
    RUST_LOG          Log level (trace, debug, info, warn, error)
"#
    );
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return Ok(Command::Help);
    }

    match args[1].as_str() {
        "cat" => {
            if args.len() < 3 {
                return Err(anyhow!("Usage: gitdoc cat <path>"));
            }
            Ok(Command::Cat {
                path: args[2].clone(),
            })
        }
        "ls" => {
            if args.len() < 3 {
                return Err(anyhow!("Usage: gitdoc ls <path>"));
            }
            Ok(Command::Ls {
                path: args[2].clone(),
            })
        }
        "save" => {
            if args.len() < 4 {
                return Err(anyhow!("Usage: gitdoc save <path> <local-file>"));
            }
            Ok(Command::Save {
                path: args[2].clone(),
                file: PathBuf::from(&args[3]),
            })
        }
        "create" => {
            if args.len() < 5 {
                return Err(anyhow!(
                    "Usage: gitdoc create <base-path> <name> <local-file>"
                ));
            }
            Ok(Command::Create {
                base_path: args[2].clone(),
                name: args[3].clone(),
                file: PathBuf::from(&args[4]),
            })
        }
        "delete" => {
            if args.len() < 3 {
                return Err(anyhow!("Usage: gitdoc delete <path>"));
            }
            Ok(Command::Delete {
                path: args[2].clone(),
            })
        }
        "upload" => {
            if args.len() < 4 {
                return Err(anyhow!("Usage: gitdoc upload <base-path> <local-file>"));
            }
            Ok(Command::Upload {
                base_path: args[2].clone(),
                file: PathBuf::from(&args[3]),
            })
        }
        "login" => {
            if args.len() < 3 {
                return Err(anyhow!("Usage: gitdoc login <token>"));
            }
            Ok(Command::Login {
                token: args[2].clone(),
            })
        }
        "logout" => Ok(Command::Logout),
        "help" | "--help" | "-h" => Ok(Command::Help),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            Ok(Command::Help)
        }
    }
}

/// Terminal prompts for commit messages and expired logins
struct ConsolePrompt;

impl CommitPrompt for ConsolePrompt {
    fn commit_message(&self, default: &str) -> Option<String> {
        eprint!("Commit message [{}]: ", default);
        let _ = io::stderr().flush();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            // EOF aborts the save
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    Some(default.to_string())
                } else {
                    Some(line.to_string())
                }
            }
        }
    }
}

impl ReauthPrompt for ConsolePrompt {
    fn confirm_relogin(&self) -> bool {
        true
    }

    fn open_login(&self, url: &str) {
        eprintln!("You need to login again. Authorize at:");
        eprintln!("  {}", url);
        eprintln!("then store the new token with `gitdoc login <token>`.");
    }
}

/// Document loaded from a local file for a command-line save
struct FileDocument {
    text: String,
    dirty: bool,
}

impl FileDocument {
    fn new(text: String, dirty: bool) -> Self {
        Self { text, dirty }
    }
}

impl EditorDocument for FileDocument {
    fn serialize(&self) -> String {
        self.text.clone()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_saved(&mut self, _new_state: &str) {
        self.dirty = false;
    }
}

/// The configured client, cache, and sync operations behind one command
struct App {
    cache: Arc<ContentsCache>,
    ops: SyncOps,
    branch: String,
}

impl App {
    fn new() -> Result<Self> {
        let config = Config::from_env().context("Incomplete repository configuration")?;
        let client = Arc::new(GithubClient::new(
            config.clone(),
            SessionStore::new(),
            Arc::new(ConsolePrompt),
        )?);
        let cache = Arc::new(ContentsCache::new(
            Arc::clone(&client) as Arc<dyn ContentsApi>
        ));
        let ops = SyncOps::new(
            client as Arc<dyn ContentsApi>,
            Arc::clone(&cache),
            Arc::new(ConsolePrompt),
            &config.branch,
        );

        Ok(Self {
            cache,
            ops,
            branch: config.branch,
        })
    }

    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Cat { path } => self.cat(&path).await?,
            Command::Ls { path } => self.ls(&path).await?,
            Command::Save { path, file } => self.save(&path, &file).await?,
            Command::Create {
                base_path,
                name,
                file,
            } => self.create(&base_path, &name, &file).await?,
            Command::Delete { path } => self.delete(&path).await?,
            Command::Upload { base_path, file } => self.upload(&base_path, &file).await?,
            // Handled in main before the app is built
            Command::Login { .. } | Command::Logout | Command::Help => {}
        }

        self.cache.log_metrics();
        Ok(())
    }

    async fn cat(&self, path: &str) -> Result<()> {
        let contents = self.cache.read(&Address::new(path, &self.branch)).await?;
        let entry = contents
            .as_file()
            .ok_or_else(|| anyhow!("{} is a directory; use ls", path))?;

        // The remote hard-wraps base64 content with newlines
        let encoded: String = entry
            .content
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .collect();
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .with_context(|| format!("Content of {} is not valid base64", path))?;

        io::stdout().write_all(&bytes)?;
        Ok(())
    }

    async fn ls(&self, path: &str) -> Result<()> {
        let contents = self.cache.read(&Address::new(path, &self.branch)).await?;
        if let Some(entries) = contents.as_dir() {
            for entry in entries {
                if entry.is_dir() {
                    println!("{}  {}/", entry.sha, entry.name);
                } else {
                    println!("{}  {}", entry.sha, entry.name);
                }
            }
        } else if let Some(entry) = contents.as_file() {
            // Listing a file path shows its single entry
            println!("{}  {}", entry.sha, entry.name);
        }
        Ok(())
    }

    async fn save(&self, path: &str, file: &PathBuf) -> Result<()> {
        let text = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;

        // Dirty means the local text differs from the last-known remote
        // copy; the read-through here is the same one the save would issue
        // for its version token
        let current = self.cache.read(&Address::new(path, &self.branch)).await?;
        let dirty = match current.as_file() {
            Some(entry) => !entry.content_matches(&text),
            None => true,
        };
        let mut document = FileDocument::new(text, dirty);

        if !document.is_dirty() {
            info!(path = %path, "Document is clean, nothing to save");
            println!("Nothing to save.");
            return Ok(());
        }

        match self.ops.save(&mut document, path).await? {
            Some(entry) => println!("Saved {} ({})", entry.path, entry.sha),
            None => println!("Save aborted."),
        }
        Ok(())
    }

    async fn create(&self, base_path: &str, name: &str, file: &PathBuf) -> Result<()> {
        let text = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;

        let response = self.ops.create(base_path, name, &text).await?;
        match response.content {
            Some(entry) => println!("Created {} ({})", entry.path, entry.sha),
            None => println!("Created {}/{}", base_path, name),
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        // The delete needs the current version token; resolve it by reading
        let contents = self.cache.read(&Address::new(path, &self.branch)).await?;
        let entry = contents
            .as_file()
            .ok_or_else(|| anyhow!("{} is a directory", path))?;

        self.ops.delete(path, &entry.sha).await?;
        println!("Deleted {}", path);
        Ok(())
    }

    async fn upload(&self, base_path: &str, file: &PathBuf) -> Result<()> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("No file name in {}", file.display()))?;
        let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

        let relative = self
            .ops
            .upload(base_path, &name, &encode::binary_string(&bytes))
            .await?;
        println!("{}", relative);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command
    let command = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    match command {
        Command::Help => print_help(),
        Command::Login { token } => {
            SessionStore::new().store(&token)?;
            println!("Token stored.");
        }
        Command::Logout => {
            SessionStore::new().clear()?;
            println!("Session cleared.");
        }
        remote => {
            let app = App::new()?;
            app.run(remote).await?;
        }
    }

    Ok(())
}
