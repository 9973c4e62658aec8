//! cerise CLI Entry Point
//!
//! Command-line interface for submitting and following jobs on a Cerise
//! service.
//!
//! # Usage
//!
//! ```bash
//! # Submit a workflow with one input file and wait for it
//! cerise submit wc.cwl count_lines --file input_file=data.txt --wait
//!
//! # Check on jobs submitted earlier
//! cerise status
//! cerise wait count_lines
//!
//! # Fetch results and clean up
//! cerise outputs count_lines --save-dir results/
//! cerise log count_lines
//! cerise delete count_lines
//!
//! # Check a workflow locally without submitting it
//! cerise check wc.cwl
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use colored::Colorize;
use log::{error, info, warn};
use serde_json::Value;

use cerise_client::client::is_valid_job_name;
use cerise_client::session::DEFAULT_SESSION_DIR;
use cerise_client::workflow::{execution_order, find_problems, read_workflow};
use cerise_client::{
    CeriseError, Job, JobState, JobWatcher, Service, Session, APP_NAME, VERSION,
};

/// Service used when none is configured anywhere.
const DEFAULT_SERVICE_URL: &str = "http://localhost:29593";

/// Default seconds between polls when waiting.
const DEFAULT_POLL_SECONDS: u64 = 5;

/// What the user asked for.
#[derive(Debug, PartialEq)]
enum Command {
    Submit {
        workflow: PathBuf,
        name: Option<String>,
        values: Vec<(String, String)>,
        files: Vec<(String, String)>,
        secondary: Vec<(String, String)>,
        wait: bool,
    },
    Status(Vec<String>),
    List,
    Wait(Vec<String>),
    Outputs {
        job: String,
        save_dir: Option<PathBuf>,
    },
    Log(String),
    Cancel(String),
    Delete(String),
    Check(PathBuf),
}

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    service_url: Option<String>,
    session_dir: PathBuf,
    poll_interval: Duration,
    verbose: bool,
    command: Command,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: cerise [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("Commands:");
    println!("  submit <WORKFLOW> [NAME]   Upload a workflow and its inputs and run it");
    println!("      --input NAME=VALUE     Set a plain input (JSON or string)");
    println!("      --file NAME=PATH       Upload a File input (repeat for File[])");
    println!("      --secondary NAME=PATH  Upload a secondary file for a File input");
    println!("      --wait                 Wait for the job to finish");
    println!("  status [JOB...]            Show job states (default: all session jobs)");
    println!("  list                       List all jobs on the service");
    println!("  wait [JOB...]              Wait for jobs to finish");
    println!("  outputs <JOB> [--save-dir DIR]");
    println!("                             List outputs, optionally downloading them");
    println!("  log <JOB>                  Print a job's log");
    println!("  cancel <JOB>               Cancel a job");
    println!("  delete <JOB>               Delete a job and its files");
    println!("  check <WORKFLOW>           Validate a workflow locally");
    println!();
    println!("JOB is a job name from this session or a service job id.");
    println!();
    println!("Options:");
    println!("  --service URL       Service location (default: $CERISE_URL or {})", DEFAULT_SERVICE_URL);
    println!("  --session-dir DIR   Where session state is kept (default: $CERISE_SESSION_DIR or .cerise)");
    println!("  --poll SECONDS      Polling interval when waiting (default: {})", DEFAULT_POLL_SECONDS);
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
}

/// Splits a `NAME=VALUE` argument.
fn parse_pair(option: &str, arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("{} expects NAME=VALUE, got '{}'", option, arg)),
    }
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut service_url = env::var("CERISE_URL").ok();
    let mut session_dir = DEFAULT_SESSION_DIR.clone();
    let mut poll_interval = Duration::from_secs(DEFAULT_POLL_SECONDS);
    let mut verbose = false;

    let mut positional: Vec<String> = Vec::new();
    let mut values = Vec::new();
    let mut files = Vec::new();
    let mut secondary = Vec::new();
    let mut wait = false;
    let mut save_dir = None;

    let mut i = 1; // Skip program name
    let next_value = |i: &mut usize, option: &str| -> Result<String, String> {
        *i += 1;
        args.get(*i)
            .cloned()
            .ok_or_else(|| format!("{} requires an argument", option))
    };

    while i < args.len() {
        let arg = args[i].as_str();

        match arg {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--verbose" | "-v" => verbose = true,
            "--wait" => wait = true,
            "--service" => service_url = Some(next_value(&mut i, arg)?),
            "--session-dir" => session_dir = PathBuf::from(next_value(&mut i, arg)?),
            "--save-dir" => save_dir = Some(PathBuf::from(next_value(&mut i, arg)?)),
            "--poll" => {
                let value = next_value(&mut i, arg)?;
                poll_interval = value
                    .parse::<f64>()
                    .ok()
                    .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
                    .filter(|interval| !interval.is_zero())
                    .ok_or_else(|| format!("Invalid poll interval: {}", value))?;
            }
            "--input" => values.push(parse_pair(arg, &next_value(&mut i, arg)?)?),
            "--file" => files.push(parse_pair(arg, &next_value(&mut i, arg)?)?),
            "--secondary" => secondary.push(parse_pair(arg, &next_value(&mut i, arg)?)?),
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            _ => positional.push(arg.to_string()),
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    let command_name = positional.next().ok_or("No command given")?;
    let rest: Vec<String> = positional.collect();

    let single = |what: &str| -> Result<String, String> {
        match rest.as_slice() {
            [one] => Ok(one.clone()),
            _ => Err(format!("'{}' expects exactly one {}", command_name, what)),
        }
    };

    let command = match command_name.as_str() {
        "submit" => match rest.as_slice() {
            [workflow] | [workflow, _] => Command::Submit {
                workflow: PathBuf::from(workflow),
                name: rest.get(1).cloned(),
                values,
                files,
                secondary,
                wait,
            },
            _ => return Err("'submit' expects <WORKFLOW> [NAME]".to_string()),
        },
        "status" => Command::Status(rest.clone()),
        "list" => Command::List,
        "wait" => Command::Wait(rest.clone()),
        "outputs" => Command::Outputs {
            job: single("job")?,
            save_dir,
        },
        "log" => Command::Log(single("job")?),
        "cancel" => Command::Cancel(single("job")?),
        "delete" => Command::Delete(single("job")?),
        "check" => Command::Check(PathBuf::from(single("workflow")?)),
        other => return Err(format!("Unknown command: {}", other)),
    };

    Ok(Config {
        service_url,
        session_dir,
        poll_interval,
        verbose,
        command,
    })
}

/// Interprets a command-line input value: JSON if it parses, else a string.
fn parse_input_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Derives a job name from the workflow file name and the current time.
fn default_job_name(workflow: &Path) -> String {
    let stem = workflow
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("job");
    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}", stem, chrono::Local::now().format("%Y%m%d-%H%M%S"))
}

/// Colors a job state for terminal output.
fn render_state(state: Option<JobState>) -> String {
    match state {
        None => "not submitted".dimmed().to_string(),
        Some(s) if s.is_success() => s.to_string().green().to_string(),
        Some(s) if s.is_running() => s.to_string().yellow().to_string(),
        Some(JobState::Cancelled) => "Cancelled".dimmed().to_string(),
        Some(s) => s.to_string().red().bold().to_string(),
    }
}

/// The session and service a command works with.
struct Workspace {
    session: Session,
    service: Service,
    /// False when the session on disk belongs to another service and must
    /// not be overwritten
    writable: bool,
}

/// Loads the session, or starts a new one for the configured service.
///
/// A session file that exists but cannot be read is an error, so that it is
/// never replaced by an empty one.
fn open_session(config: &Config) -> Result<Workspace, Box<dyn std::error::Error>> {
    let existing = match Session::load(&config.session_dir) {
        Ok(session) => Some(session),
        Err(CeriseError::Io(e)) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            return Err(format!(
                "Cannot read session {}: {} (repair or remove it, or use --session-dir)",
                Session::file_path(&config.session_dir).display(),
                e
            )
            .into())
        }
    };

    let service = match (&config.service_url, &existing) {
        (Some(url), _) => Service::from_url(url)?,
        (None, Some(session)) => Service::from_info(session.service.clone())?,
        (None, None) => Service::from_url(DEFAULT_SERVICE_URL)?,
    };

    let (session, writable) = match existing {
        Some(session) if &session.service == service.info() => (session, true),
        Some(_) => {
            warn!(
                "Session in {} belongs to another service; its jobs are not used",
                config.session_dir.display()
            );
            (Session::new(service.info().clone()), false)
        }
        None => (Session::new(service.info().clone()), true),
    };

    info!("Service: {}", service.url());
    Ok(Workspace {
        session,
        service,
        writable,
    })
}

/// Finds a job by session name, falling back to treating it as an id.
fn resolve_job(
    service: &Service,
    session: &Session,
    reference: &str,
) -> Result<Job, Box<dyn std::error::Error>> {
    let id = session.job_id(reference).unwrap_or(reference);
    Ok(service.get_job_by_id(id)?)
}

/// Uploads the workflow and inputs of a created job and submits it.
fn fill_and_run(
    job: &mut Job,
    workflow: &Path,
    files: &[(String, String)],
    secondary: &[(String, String)],
    values: &[(String, String)],
) -> cerise_client::Result<String> {
    job.set_workflow(workflow)?;

    // Repeated --file options for one input make an array input
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (input, path) in files {
        grouped.entry(input.as_str()).or_default().push(path.as_str());
    }
    for (input, paths) in grouped {
        match paths.as_slice() {
            [path] => job.add_input_file(input, path)?,
            _ => job.add_input_files(input, paths.as_slice())?,
        }
    }

    for (input, path) in secondary {
        job.add_secondary_file(input, path)?;
    }

    for (input, raw) in values {
        job.set_input(input, parse_input_value(raw))?;
    }

    job.run()
}

fn submit(config: &Config, workspace: &mut Workspace) -> Result<(), Box<dyn std::error::Error>> {
    let Command::Submit {
        workflow,
        name,
        values,
        files,
        secondary,
        wait,
    } = &config.command
    else {
        return Ok(());
    };

    let name = name.clone().unwrap_or_else(|| default_job_name(workflow));
    if !is_valid_job_name(&name) {
        return Err(format!("Invalid job name: {}", name).into());
    }
    if !workspace.writable {
        return Err(format!(
            "Session in {} belongs to another service; use --session-dir",
            config.session_dir.display()
        )
        .into());
    }

    // Everything checkable locally is checked before the service is touched
    read_workflow(workflow)?;
    for (_, path) in files.iter().chain(secondary) {
        if !Path::new(path).is_file() {
            return Err(CeriseError::FileNotFound(PathBuf::from(path)).into());
        }
    }

    let mut job = workspace.service.create_job(&name)?;
    let id = match fill_and_run(&mut job, workflow, files, secondary, values) {
        Ok(id) => id,
        Err(e) => {
            if let Err(cleanup) = job.discard() {
                warn!("Could not remove the inputs of job '{}': {}", name, cleanup);
            }
            return Err(e.into());
        }
    };

    workspace.session.record_job(&name, &id);
    workspace.session.save(&config.session_dir)?;

    println!("Submitted {} as {}", name.bold(), id);

    if *wait {
        let state = job.wait(config.poll_interval)?;
        println!("{}: {}", name, render_state(Some(state)));
        if !state.is_success() {
            return Err(format!("Job '{}' ended in state {}", name, state).into());
        }
    }

    Ok(())
}

fn show_status(
    service: &Service,
    session: &Session,
    references: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let references: Vec<String> = if references.is_empty() {
        session.jobs.keys().cloned().collect()
    } else {
        references.to_vec()
    };

    if references.is_empty() {
        println!("No jobs in this session");
        return Ok(());
    }

    for reference in &references {
        match resolve_job(service, session, reference) {
            Ok(job) => println!("{:24} {}", job.name(), render_state(job.state()?)),
            Err(e) => println!("{:24} {}", reference, e.to_string().red()),
        }
    }
    Ok(())
}

fn list_jobs(service: &Service) -> Result<(), Box<dyn std::error::Error>> {
    let jobs = service.list_jobs()?;
    if jobs.is_empty() {
        println!("No jobs on {}", service.url());
    }
    for job in jobs {
        println!(
            "{:24} {:36} {}",
            job.name(),
            job.id().unwrap_or("-"),
            render_state(job.state()?)
        );
    }
    Ok(())
}

fn wait_for(
    config: &Config,
    service: &Service,
    session: &Session,
    references: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let references: Vec<String> = if references.is_empty() {
        session.jobs.keys().cloned().collect()
    } else {
        references.to_vec()
    };

    let jobs = references
        .iter()
        .map(|r| resolve_job(service, session, r))
        .collect::<Result<Vec<_>, _>>()?;

    let mut watcher = JobWatcher::new();
    watcher.set_poll_interval(config.poll_interval);
    let report = watcher.watch(jobs);

    println!();
    print!("{}", report.summary());
    if config.verbose {
        print!("{}", report.timeline.event_log());
        print!("{}", report.timeline.gantt_chart());
    }

    if report.all_succeeded() {
        Ok(())
    } else {
        Err(format!("Unsuccessful jobs: {}", report.unsuccessful().join(", ")).into())
    }
}

fn show_outputs(
    job: &Job,
    save_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(outputs) = job.outputs()? else {
        let state = job.state()?;
        return Err(format!(
            "Job '{}' has no outputs (state: {})",
            job.name(),
            state.map(|s| s.to_string()).unwrap_or_else(|| "not submitted".to_string())
        )
        .into());
    };

    if let Some(dir) = save_dir {
        fs::create_dir_all(dir)?;
    }

    for (name, output) in &outputs {
        let files = output.files();
        if files.is_empty() {
            println!("{:16} {:?}", name, output);
            continue;
        }
        for file in files {
            println!("{:16} {}", name, file.uri());
            if let Some(dir) = save_dir {
                file.save_as(dir.join(file.file_name()))?;
                for extra in file.secondary_files() {
                    extra.save_as(dir.join(extra.file_name()))?;
                }
            }
        }
    }
    Ok(())
}

fn check_workflow(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let document = read_workflow(path)?;
    let problems = find_problems(&document);

    if !problems.is_empty() {
        for problem in &problems {
            println!("{} {}", "error:".red().bold(), problem);
        }
        return Err(format!("{} problems in {}", problems.len(), path.display()).into());
    }

    println!("{} {} ({:?})", "ok:".green().bold(), path.display(), document.class);
    for input in &document.inputs {
        let marker = if input.is_required() { "required" } else { "optional" };
        println!("  input  {:20} {:10} {}", input.id, input.param_type.to_string(), marker);
    }
    for output in &document.outputs {
        println!("  output {:20} {}", output.id, output.param_type.to_string());
    }
    if document.is_workflow() {
        println!("  steps  {}", execution_order(&document)?.join(" -> "));
    }
    Ok(())
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);

    // Local-only command, no service needed
    if let Command::Check(path) = &config.command {
        return check_workflow(path);
    }

    let mut workspace = open_session(&config)?;

    match &config.command {
        Command::Submit { .. } => submit(&config, &mut workspace)?,
        Command::Status(jobs) => show_status(&workspace.service, &workspace.session, jobs)?,
        Command::List => list_jobs(&workspace.service)?,
        Command::Wait(jobs) => wait_for(&config, &workspace.service, &workspace.session, jobs)?,
        Command::Outputs { job, save_dir } => {
            let job = resolve_job(&workspace.service, &workspace.session, job)?;
            show_outputs(&job, save_dir.as_deref())?;
        }
        Command::Log(reference) => {
            let job = resolve_job(&workspace.service, &workspace.session, reference)?;
            print!("{}", job.log()?);
        }
        Command::Cancel(reference) => {
            let job = resolve_job(&workspace.service, &workspace.session, reference)?;
            job.cancel()?;
            println!("Cancellation requested for {}", job.name());
        }
        Command::Delete(reference) => {
            let mut job = resolve_job(&workspace.service, &workspace.session, reference)?;
            let name = job.name().to_string();
            job.delete()?;
            if workspace.writable && workspace.session.forget_job(&name).is_some() {
                workspace.session.save(&config.session_dir)?;
            }
            println!("Deleted {}", name);
        }
        Command::Check(_) => {}
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
