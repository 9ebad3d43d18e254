//! The `/alias` command: assign, remove, and show contact aliases.

use std::sync::Arc;

use mixchat_proto::Identity;
use mixchat_store::{AliasDirectory, AliasRecord};

use crate::{
    AliasCache, DisplaySink, Session,
    commands::{Command, CommandError},
};

const COMMAND_NAME: &str = "alias";
const ADD_SUBCOMMAND: &str = "add";
const REMOVE_SUBCOMMAND: &str = "remove";
const SHOW_SUBCOMMAND: &str = "show";
const ALL_MODIFIER: &str = "all";
/// Sentinel shown in place of an empty alias.
const NO_ALIAS: &str = "<none>";

/// Names an alias may never take: they would be ambiguous with the command
/// grammar or the no-alias sentinel.
const RESERVED_NAMES: [&str; 6] = [
    NO_ALIAS,
    COMMAND_NAME,
    SHOW_SUBCOMMAND,
    REMOVE_SUBCOMMAND,
    ADD_SUBCOMMAND,
    ALL_MODIFIER,
];

fn is_valid_name(name: &str) -> bool {
    !RESERVED_NAMES.contains(&name)
}

/// Render a directory record for display.
pub fn format_record(record: &AliasRecord) -> String {
    let name = if record.name.is_empty() { NO_ALIAS } else { record.name.as_str() };
    format!(
        "Alias: {name} - Public Key: {} Provider's Public Key: {}",
        record.identity.public_key.to_base64(),
        record.identity.provider_key.to_base64()
    )
}

/// Handler for the `/alias` command.
///
/// Mutations write through to the directory, then bring the session and
/// cache in line: a successful add/remove for the current session's peer
/// updates the session's display alias, and the cache entry for any
/// mutated handle is invalidated.
pub struct AliasCommand<S, D>
where
    S: AliasDirectory,
    D: DisplaySink,
{
    directory: S,
    cache: AliasCache<S>,
    session: Session,
    display: Arc<D>,
}

impl<S, D> AliasCommand<S, D>
where
    S: AliasDirectory,
    D: DisplaySink,
{
    /// Create the command over the shared directory, cache, and session.
    pub fn new(directory: S, cache: AliasCache<S>, session: Session, display: Arc<D>) -> Self {
        Self { directory, cache, session, display }
    }

    /// Parse a pair of base64 key arguments into an identity handle.
    fn target_from_args(&self, peer: &str, provider: &str) -> Result<Identity, CommandError> {
        Identity::from_base64(peer, provider).map_err(|_| CommandError::InvalidArguments)
    }

    /// `add <name>` assigns to the current peer;
    /// `add <b64peer> <b64provider> <name>` assigns to an arbitrary peer.
    fn handle_add(&self, args: &[&str]) -> Result<(), CommandError> {
        // args[0] is the subcommand itself and always exists
        match args.len() {
            1 => Err(CommandError::NotEnoughArguments),
            2 => {
                let name = args[1];
                if !is_valid_name(name) {
                    return Err(CommandError::InvalidArguments);
                }

                let recipient = self.session.recipient();
                self.directory.put(&recipient, name)?;
                self.session.update_alias(name);
                self.cache.invalidate(&recipient);
                Ok(())
            },
            4 => {
                let name = args[3];
                if !is_valid_name(name) {
                    return Err(CommandError::InvalidArguments);
                }

                let target = self.target_from_args(args[1], args[2])?;
                self.directory.put(&target, name)?;
                if target == self.session.recipient() {
                    self.session.update_alias(name);
                }
                self.cache.invalidate(&target);
                Ok(())
            },
            _ => Err(CommandError::InvalidArguments),
        }
    }

    /// `remove` clears the current peer's alias;
    /// `remove <b64peer> <b64provider>` clears an arbitrary peer's;
    /// `remove all` clears the entire directory.
    fn handle_remove(&self, args: &[&str]) -> Result<(), CommandError> {
        // args[0] is the subcommand itself and always exists
        match args.len() {
            1 => {
                let recipient = self.session.recipient();
                self.directory.remove(&recipient)?;
                self.session.update_alias("");
                self.cache.invalidate(&recipient);
                Ok(())
            },
            2 if args[1] == ALL_MODIFIER => {
                self.directory.remove_all()?;
                Ok(())
            },
            2 => Err(CommandError::InvalidArguments),
            3 => {
                let target = self.target_from_args(args[1], args[2])?;
                self.directory.remove(&target)?;
                if target == self.session.recipient() {
                    self.session.update_alias("");
                }
                self.cache.invalidate(&target);
                Ok(())
            },
            _ => Err(CommandError::InvalidArguments),
        }
    }

    /// `show` prints the current peer's record;
    /// `show <name>` prints every record with that alias;
    /// `show all` prints the entire directory.
    fn handle_show(&self, args: &[&str]) -> Result<(), CommandError> {
        // args[0] is the subcommand itself and always exists
        match args.len() {
            1 => {
                // An unset alias still yields a record for the handle.
                let record = self.directory.get(&self.session.recipient())?;
                self.display.write_info(&format_record(&record), "alias_info");
                Ok(())
            },
            2 => {
                let records = if args[1] == ALL_MODIFIER {
                    let records = self.directory.list_all()?;
                    if records.is_empty() {
                        self.display.write_info("no aliases assigned", "alias_info");
                    }
                    records
                } else {
                    let records = self.directory.list_by_name(args[1])?;
                    if records.is_empty() {
                        self.display.write_info(
                            &format!("no clients with alias: {}", args[1]),
                            "alias_info",
                        );
                    }
                    records
                };

                for record in &records {
                    self.display.write_info(&format_record(record), "alias_info");
                }
                Ok(())
            },
            _ => Err(CommandError::InvalidArguments),
        }
    }
}

impl<S, D> Command for AliasCommand<S, D>
where
    S: AliasDirectory,
    D: DisplaySink,
{
    fn name(&self) -> &'static str {
        COMMAND_NAME
    }

    fn usage(&self) -> String {
        [
            format!("\t/{COMMAND_NAME}:"),
            format!("\t\t - /{COMMAND_NAME} {ADD_SUBCOMMAND} <aliased_name>"),
            format!(
                "\t\t - /{COMMAND_NAME} {ADD_SUBCOMMAND} <b64_public_key> <b64_provider_public_key> <aliased_name>"
            ),
            format!("\t\t - /{COMMAND_NAME} {REMOVE_SUBCOMMAND}"),
            format!(
                "\t\t - /{COMMAND_NAME} {REMOVE_SUBCOMMAND} <b64_public_key> <b64_provider_public_key>"
            ),
            format!("\t\t - /{COMMAND_NAME} {REMOVE_SUBCOMMAND} {ALL_MODIFIER}"),
            format!("\t\t - /{COMMAND_NAME} {SHOW_SUBCOMMAND}"),
            format!("\t\t - /{COMMAND_NAME} {SHOW_SUBCOMMAND} <aliased_name>"),
            format!("\t\t - /{COMMAND_NAME} {SHOW_SUBCOMMAND} {ALL_MODIFIER}"),
        ]
        .join("\n")
    }

    fn handle(&self, args: &[&str]) -> Result<(), CommandError> {
        // args[0] is the command name itself and always exists
        if args.len() == 1 {
            return Err(CommandError::NotEnoughArguments);
        }
        if args[0] != COMMAND_NAME {
            return Err(CommandError::HandlerMismatch {
                expected: COMMAND_NAME,
                got: args[0].to_string(),
            });
        }

        match args[1] {
            ADD_SUBCOMMAND => self.handle_add(&args[1..]),
            REMOVE_SUBCOMMAND => self.handle_remove(&args[1..]),
            SHOW_SUBCOMMAND => self.handle_show(&args[1..]),
            other => Err(CommandError::UnknownSubcommand(other.to_string())),
        }
    }
}
