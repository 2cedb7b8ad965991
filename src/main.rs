use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use todo_web_client::{
    view::{render_task_list_html, render_task_list_text},
    AuthProvider, BasicAuth, ClientConfig, Command, Effects, FileStore, LoginSchema, Page,
    PageController, RegisterSchema, TaskApi, TaskId,
};

#[derive(Debug, Parser)]
#[command(name = "todo", version, about = "Manage your task list from the terminal")]
struct CommandLineArgs {
    /// Backend base URL (overrides TODO_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print the task list as HTML list items.
    #[arg(long, global = true)]
    html: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Check credentials against the server and remember them.
    Login {
        email: String,
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register {
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the task list.
    List,
    /// Add a task.
    Add {
        #[arg(required = true)]
        content: Vec<String>,
    },
    /// Mark a task as done.
    Complete { id: i64 },
    /// Mark a task as not done.
    Reopen { id: i64 },
    /// Replace a task's text.
    Edit {
        id: i64,
        #[arg(required = true)]
        content: Vec<String>,
    },
    /// Delete a task.
    Delete { id: i64 },
    /// Forget the stored credentials.
    Logout,
}

impl Action {
    fn into_command(self) -> Command {
        match self {
            Action::Login { email, password } => Command::Login(LoginSchema { email, password }),
            Action::Register {
                email,
                first_name,
                last_name,
                password,
            } => Command::Register(RegisterSchema {
                email,
                password,
                first_name,
                last_name,
            }),
            Action::List => Command::Load(Page::Home),
            Action::Add { content } => Command::AddTask {
                content: content.join(" "),
            },
            Action::Complete { id } => Command::ToggleCompletion {
                id: TaskId(id),
                completed: true,
            },
            Action::Reopen { id } => Command::ToggleCompletion {
                id: TaskId(id),
                completed: false,
            },
            Action::Edit { id, content } => Command::EditTask {
                id: TaskId(id),
                content: content.join(" "),
            },
            Action::Delete { id } => Command::DeleteTask { id: TaskId(id) },
            Action::Logout => Command::Logout,
        }
    }
}

// Entry point of the application
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))?;

    let CommandLineArgs {
        api_url,
        html,
        action,
    } = CommandLineArgs::parse();

    let mut config = ClientConfig::load();
    if let Some(api_url) = api_url {
        config = config.with_api_url(&api_url);
    }

    let page = PageController::new(
        TaskApi::new(&config.api_url),
        BasicAuth::new(FileStore::new(&config.auth_file)),
        &config,
    );

    if run(&page, action.into_command(), html).await {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Runs one command and follows its navigation. Failures are reported as
/// alerts (and logged by the controller), never as a returned error.
async fn run<A: AuthProvider>(page: &PageController<A>, command: Command, html: bool) -> bool {
    let result = page.dispatch(command).await;
    print_alerts(page);
    match result {
        Ok(effects) => follow(page, effects, html).await,
        Err(_) => false,
    }
}

async fn follow<A: AuthProvider>(page: &PageController<A>, effects: Effects, html: bool) -> bool {
    if effects.rendered {
        print_list(page, html);
    }

    let Some(navigation) = effects.navigation else {
        return true;
    };
    if !navigation.delay.is_zero() {
        tokio::time::sleep(navigation.delay).await;
    }
    println!("-> {}", navigation.to.path());

    if navigation.to.shows_task_list() {
        let loaded = page.load(navigation.to).await;
        print_alerts(page);
        if loaded.is_err() {
            return false;
        }
        print_list(page, html);
    }
    true
}

fn print_alerts<A: AuthProvider>(page: &PageController<A>) {
    for alert in page.visible_alerts() {
        println!("{alert}");
    }
}

fn print_list<A: AuthProvider>(page: &PageController<A>, html: bool) {
    let items = page.rendered();
    if html {
        println!("{}", render_task_list_html(&items));
    } else if items.is_empty() {
        println!("No tasks.");
    } else {
        print!("{}", render_task_list_text(&items));
    }
}
