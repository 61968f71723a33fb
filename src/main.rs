use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use taskdesk::config::{load_config, print_schema, DEFAULT_CONFIG_PATH};
use taskdesk::error::ClientError;
use taskdesk::models::{LoginRequest, NewTask, RegistrationRequest, Task, TaskStatus, TaskUpdate};
use taskdesk::startup::connect;
use taskdesk::utils::init_logging;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "taskdesk", about = "Task manager client with persistent login")]
struct Cli {
    #[arg(long, env = "TASKDESK_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the configuration JSON schema.
    Schema,
    /// Log in and store the issued tokens.
    Login { username: String, password: String },
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Show the current user.
    Whoami,
    /// Forget the stored tokens.
    Logout,
    /// List tasks, optionally filtered by status (pending, in_progress, done).
    Tasks { status: Option<TaskStatus> },
    Add {
        title: String,
        description: Option<String>,
    },
    /// Mark a task as done.
    Done { id: i64 },
    Rm { id: i64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    if let Command::Schema = cli.command {
        return print_schema();
    }

    let config = load_config(&cli.config).map_err(|e| {
        ClientError::Config(format!(
            "could not load {}: {}",
            cli.config.display(),
            e
        ))
    })?;
    init_logging(&config.logging)?;

    let state = connect(config).await.map_err(|e| {
        error!("Failed to build client: {}", e);
        e
    })?;

    match cli.command {
        Command::Schema => {}
        Command::Login { username, password } => {
            match state.auth.login(&LoginRequest::new(username, password)).await? {
                Some(user) => println!("Logged in as user {}", user.id),
                None => println!("Login succeeded but the issued token is not usable"),
            }
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let registration = RegistrationRequest::new(username, email, password);
            match state.auth.register(&registration).await? {
                Some(user) => println!("Registered and logged in as user {}", user.id),
                None => println!("Registered; log in to continue"),
            }
        }
        Command::Whoami => match state.session.current_user() {
            Some(user) => println!("{}", user.id),
            None => println!("Not logged in"),
        },
        Command::Logout => {
            state.auth.logout().await?;
            println!("Logged out");
        }
        Command::Tasks { status } => print_tasks(&state.tasks.list(status).await?),
        Command::Add { title, description } => {
            let mut task = NewTask::new(title);
            if let Some(description) = description {
                task = task.with_description(description);
            }
            print_task(&state.tasks.create(&task).await?);
        }
        Command::Done { id } => {
            let task = state
                .tasks
                .update(id, &TaskUpdate::status(TaskStatus::Done))
                .await?;
            print_task(&task);
        }
        Command::Rm { id } => {
            state.tasks.delete(id).await?;
            println!("Deleted task {}", id);
        }
    }
    Ok(())
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks");
    }
    for task in tasks {
        print_task(task);
    }
}

fn print_task(task: &Task) {
    match &task.description {
        Some(description) => println!("{:>5}  [{}]  {}  {}", task.id, task.status, task.title, description),
        None => println!("{:>5}  [{}]  {}", task.id, task.status, task.title),
    }
}
