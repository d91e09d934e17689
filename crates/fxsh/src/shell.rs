//! # Shell
//!
//! Executes parsed commands against a [`Runtime`] and its store.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use fxrun::FunctionManifest;
use fxrun::Runtime;
use fxstore::ContentId;
use tracing::info;

use crate::command;
use crate::command::Command;
use crate::command::ParseError;

pub const HELP: &str = "\
Commands:
  add_<text>                              store text, print its id
  addFile_<path>                          store a file, print its id
  get_<id>                                print a blob
  abi_<id>                                print a function manifest
  deploy_<path>_<fx>&..[_<type>&..]       deploy bytecode; a type may be name@<codec id>
  call_<manifest>_<fx>[_<arg>&..]         call a function, print the output id
  script_<path>                           run commands from a file (# starts a comment)
  help
  exit";

#[derive(Debug)]
pub enum Error {
    Parse(ParseError),
    Io { path: PathBuf, source: std::io::Error },
    Store(fxstore::Error),
    Run(fxrun::Error),
    /// A command inside a script failed; the script stopped there.
    Script { path: PathBuf, line: usize, source: Box<Error> },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::Io { path, source } => write!(f, "Couldn't read {}: {}", path.display(), source),
            Self::Store(e) => write!(f, "Store error: {}", e),
            Self::Run(e) => write!(f, "{} ({:?})", e, e.class()),
            Self::Script { path, line, source } => {
                write!(f, "{}:{}: {}", path.display(), line, source)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<fxstore::Error> for Error {
    fn from(e: fxstore::Error) -> Self {
        Self::Store(e)
    }
}

impl From<fxrun::Error> for Error {
    fn from(e: fxrun::Error) -> Self {
        Self::Run(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added(ContentId),
    Blob(Vec<u8>),
    Manifest(FunctionManifest),
    Deployed(ContentId),
    Called(ContentId),
    /// Every command a script ran, with its outcome, in order.
    Script(Vec<(String, Outcome)>),
    Help,
    Exit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added(id) => write!(f, "Added blob with id: {}", id),
            Self::Blob(bytes) => write!(f, "Get: {}", String::from_utf8_lossy(bytes)),
            Self::Manifest(m) => {
                writeln!(f, "entrypoints: {}", m.entrypoints().join(", "))?;
                writeln!(f, "bytecode:    {}", m.bytecode())?;
                let args: Vec<String> = m
                    .args()
                    .iter()
                    .map(|ty| match &ty.codec {
                        Some(codec) => format!("{}@{}", ty.name, codec),
                        None => ty.name.clone(),
                    })
                    .collect();
                write!(f, "args:        [{}]", args.join(", "))
            }
            Self::Deployed(id) => write!(f, "Deployed function with id: {}", id),
            Self::Called(id) => write!(f, "Output id: {}", id),
            Self::Script(steps) => {
                for (i, (line, outcome)) in steps.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, ">> {}\n{}", line, outcome)?;
                }
                Ok(())
            }
            Self::Help => write!(f, "{}", HELP),
            Self::Exit => write!(f, "Bye"),
        }
    }
}

#[derive(Clone)]
pub struct Shell {
    runtime: Runtime,
}

impl Shell {
    pub fn new(runtime: Runtime) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Parses and executes one line.
    pub async fn exec_line(&self, line: &str) -> Result<Outcome> {
        let cmd = command::parse(line)?;
        self.exec(cmd).await
    }

    pub async fn exec(&self, cmd: Command) -> Result<Outcome> {
        let store = self.runtime.store();
        match cmd {
            Command::Add(text) => Ok(Outcome::Added(store.put(text.as_bytes()).await?)),
            Command::AddFile(path) => {
                let bytes = read(&path).await?;
                Ok(Outcome::Added(store.put(&bytes).await?))
            }
            Command::Get(id) => Ok(Outcome::Blob(store.get(&id).await?)),
            Command::Abi(id) => Ok(Outcome::Manifest(self.runtime.manifest(&id).await?)),
            Command::Deploy { path, entrypoints, args } => {
                let bytecode = read(&path).await?;
                let id = self.runtime.deploy(&bytecode, entrypoints, args).await?;
                Ok(Outcome::Deployed(id))
            }
            Command::Call { manifest, entrypoint, args } => {
                let id = self.runtime.call(&manifest, &entrypoint, &args).await?;
                Ok(Outcome::Called(id))
            }
            Command::Script(path) => Box::pin(self.run_script(&path)).await,
            Command::Help => Ok(Outcome::Help),
            Command::Exit => Ok(Outcome::Exit),
        }
    }

    /// Runs every non-blank, non-`#` line of a script in order.
    ///
    /// Stops at the first failing command, or after an `exit`.
    pub async fn run_script(&self, path: &Path) -> Result<Outcome> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;

        let mut steps = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            info!(script = %path.display(), line = index + 1, command = line, "script step");
            let outcome = self.exec_line(line).await.map_err(|e| Error::Script {
                path: path.to_path_buf(),
                line: index + 1,
                source: Box::new(e),
            })?;

            let done = outcome == Outcome::Exit;
            steps.push((line.to_string(), outcome));
            if done {
                break;
            }
        }
        Ok(Outcome::Script(steps))
    }
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| Error::Io { path: path.to_path_buf(), source })
}
