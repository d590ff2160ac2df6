use clap::{Parser, Subcommand};
use std::path::PathBuf;

use disclose::assistant::Assistant;
use disclose::conversation::Conversation;
use disclose::disclosure::{format_catalog, format_details, read_skill_file};
use disclose::reasoner::OfflineReasoner;
use disclose::skills::{load_skills, SkillRegistry};

mod commands;

use commands::ReplCommand;

#[derive(Parser)]
#[command(name = "disclose")]
#[command(about = "Disclose skill assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory, a default config, and the bundled skills.
    Init {
        /// Config file path (default: DISCLOSE_CONFIG_PATH or ~/.disclose/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Load skills and print the catalog plus any skills that were skipped.
    Skills {
        /// Config file path (default: DISCLOSE_CONFIG_PATH or ~/.disclose/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Skills root (default: DISCLOSE_SKILLS_DIR, then skills.directory, then skills/ next to the config)
        #[arg(long, value_name = "DIR")]
        skills_dir: Option<PathBuf>,
    },

    /// Chat with the assistant (interactive). Type /help for commands.
    Chat {
        /// Config file path (default: DISCLOSE_CONFIG_PATH or ~/.disclose/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Skills root (default: DISCLOSE_SKILLS_DIR, then skills.directory, then skills/ next to the config)
        #[arg(long, value_name = "DIR")]
        skills_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("disclose {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Skills { config, skills_dir }) => {
            if let Err(e) = run_skills(config, skills_dir) {
                log::error!("skills failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config, skills_dir }) => {
            if let Err(e) = run_chat(config, skills_dir).await {
                log::error!("chat failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(disclose::config::default_config_path);
    let dir = disclose::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

/// Load config and skills the same way for every command that needs a registry.
fn load(
    config_path: Option<PathBuf>,
    skills_dir: Option<PathBuf>,
) -> anyhow::Result<(disclose::config::Config, SkillRegistry)> {
    let (config, path) = disclose::config::load_config(config_path)?;
    let root = disclose::config::resolve_skills_root(skills_dir, &config, &path);
    disclose::init::require_skills_root(&root)?;
    let registry = load_skills(&root, &config.load_options(&path))?;
    Ok((config, registry))
}

fn run_skills(config_path: Option<PathBuf>, skills_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let (_, registry) = load(config_path, skills_dir)?;
    print!("{}", with_newline(format_catalog(&registry.catalog())));
    if !registry.diagnostics().is_empty() {
        println!("\nSkipped:");
        for d in registry.diagnostics() {
            println!("- {}", d);
        }
    }
    Ok(())
}

async fn run_chat(config_path: Option<PathBuf>, skills_dir: Option<PathBuf>) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let (config, registry) = load(config_path, skills_dir)?;
    let show_attribution = config.assistant.show_attribution;
    let assistant = Assistant::new(registry, OfflineReasoner, config.assistant_options());
    let mut conversation = Conversation::new();
    log::info!("started conversation {}", conversation.id());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match commands::parse(&line) {
            ReplCommand::Exit => break,
            ReplCommand::New => {
                conversation = Conversation::new();
                println!("< started a new conversation");
                log::info!("started conversation {}", conversation.id());
            }
            ReplCommand::Skills => {
                let registry = assistant.registry().await;
                print!("{}", with_newline(format_catalog(&registry.catalog())));
            }
            ReplCommand::Skill(query) => match assistant.registry().await.lookup(query) {
                Some(skill) => print!("{}", with_newline(format_details(&skill))),
                None => println!("< no skill named '{}'", query),
            },
            ReplCommand::File { skill, path } => match assistant.registry().await.lookup(skill) {
                Some(found) => match read_skill_file(&found, std::path::Path::new(path)) {
                    Ok(text) => print!("{}", with_newline(text)),
                    Err(e) => eprintln!("{}", e),
                },
                None => println!("< no skill named '{}'", skill),
            },
            ReplCommand::Use { id, argument } => {
                let reply = assistant.invoke_skill(&mut conversation, id, argument).await;
                print_reply(&reply, show_attribution);
            }
            ReplCommand::Reload => match assistant.reload().await {
                Ok(registry) => {
                    println!(
                        "< reloaded {} skill(s), {} skipped",
                        registry.len(),
                        registry.diagnostics().len()
                    );
                    for d in registry.diagnostics() {
                        println!("  - {}", d);
                    }
                }
                Err(e) => eprintln!("reload failed: {}", e),
            },
            ReplCommand::Help => println!("{}", commands::HELP),
            ReplCommand::Invalid(message) => eprintln!("{}", message),
            ReplCommand::Message(text) => {
                let reply = assistant.handle_request(&mut conversation, text).await;
                print_reply(&reply, show_attribution);
            }
        }
    }

    Ok(())
}

fn print_reply(reply: &disclose::assistant::Reply, show_attribution: bool) {
    if let Some(failure) = &reply.failure {
        eprintln!("skill {} failed: {}", failure.skill, failure.error);
    }
    println!("< {}", reply.render(show_attribution).trim());
}

fn with_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}
