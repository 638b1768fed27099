use anyhow::{Context, Result, bail};
use std::env;
use std::sync::Arc;
use synchrohnize::cli::{self, Command, ExportSelection};
use synchrohnize::config::Config;
use synchrohnize::context::{AppContext, StandardContext};
use synchrohnize::llm::OpenAiClient;
use synchrohnize::mail::ConfiguredMailer;
use synchrohnize::model::{OfficeHourInput, ScheduleEntryDraft};
use synchrohnize::parser::emit::{Framing, WriterEmitter};
use synchrohnize::service::{
    CalendarFormat, CourseService, OfficeHourService, ParseService, ServiceResponse,
};
use synchrohnize::logging;
use synchrohnize::store::ScheduleStore;
use tokio::io::AsyncReadExt;

async fn read_stdin() -> Result<String> {
    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("Failed to read stdin")?;
    Ok(raw)
}

/// Prints the payload as pretty JSON, or fails with the response message.
fn finish<T: serde::Serialize>(resp: ServiceResponse<T>) -> Result<()> {
    if !resp.success {
        bail!("{} ({})", resp.message, resp.status_code);
    }
    log::info!("{}", resp.message);
    if let Some(data) = resp.response_object {
        println!("{}", serde_json::to_string_pretty(&data)?);
    }
    Ok(())
}

/// Accepts either parsed drafts or plain entries on stdin.
fn inputs_from_json(raw: &str) -> Result<Vec<OfficeHourInput>> {
    if let Ok(inputs) = serde_json::from_str::<Vec<OfficeHourInput>>(raw) {
        return Ok(inputs);
    }
    let drafts: Vec<ScheduleEntryDraft> =
        serde_json::from_str(raw).context("stdin is not a JSON array of office hours")?;
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            OfficeHourInput::try_from(d).map_err(|e| anyhow::anyhow!("Entry {}: {}", i + 1, e))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = match cli::parse_args(&args) {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            cli::print_help("synchrohnize");
            std::process::exit(2);
        }
    };
    if invocation.command == Command::Help {
        cli::print_help("synchrohnize");
        return Ok(());
    }

    let ctx: Arc<dyn AppContext> = Arc::new(StandardContext::new(invocation.root.clone()));
    let config = Config::load_or_default(ctx.as_ref())?;
    let level = if invocation.verbose {
        log::LevelFilter::Debug
    } else {
        config.log_level()
    };
    logging::init(ctx.as_ref(), level)?;

    let store = ScheduleStore::open(ctx.as_ref())?;

    match invocation.command {
        Command::Help => cli::print_help("synchrohnize"),
        Command::Stream { course_id, lines } => {
            let raw = read_stdin().await?;
            let framing = if lines { Framing::Lines } else { config.stream_framing };
            let service = ParseService::new(OpenAiClient::from_config(&config)?);
            let mut emitter = WriterEmitter::new(tokio::io::stdout(), framing);
            let resp = service.parse_stream(course_id, &raw, &mut emitter).await;
            if !resp.success {
                bail!("{} ({})", resp.message, resp.status_code);
            }
        }
        Command::Parse { course_id } => {
            let raw = read_stdin().await?;
            let service = ParseService::new(OpenAiClient::from_config(&config)?);
            finish(service.parse_batch(course_id, &raw).await)?;
        }
        Command::Preview => {
            let raw = read_stdin().await?;
            let service = ParseService::new(OpenAiClient::from_config(&config)?);
            let resp = service.preview_markdown(&raw).await;
            if !resp.success {
                bail!("{} ({})", resp.message, resp.status_code);
            }
            println!("{}", resp.into_data().unwrap_or_default());
        }
        Command::Import { user_id } => {
            let inputs = inputs_from_json(&read_stdin().await?)?;
            let service = OfficeHourService::new(store, ConfiguredMailer::from_config(&config)?, config);
            finish(service.store_list(inputs, &user_id))?;
        }
        Command::Update { user_id, id } => {
            let mut inputs = inputs_from_json(&format!("[{}]", read_stdin().await?.trim()))?;
            let Some(input) = inputs.pop() else {
                bail!("stdin must hold one office hour");
            };
            let service = OfficeHourService::new(store, ConfiguredMailer::from_config(&config)?, config);
            finish(service.update(id, input, &user_id).await)?;
        }
        Command::Delete { user_id, ids } => {
            let service = OfficeHourService::new(store, ConfiguredMailer::from_config(&config)?, config);
            finish(service.delete(&ids, &user_id))?;
        }
        Command::Export { selection, data_url } => {
            let format = if data_url { CalendarFormat::DataUrl } else { CalendarFormat::Ics };
            let service = OfficeHourService::new(store, ConfiguredMailer::from_config(&config)?, config);
            let resp = match selection {
                ExportSelection::User(user_id) => service.calendar_by_user(&user_id, format),
                ExportSelection::Ids(ids) => service.calendar_by_ids(&ids, format),
            };
            if !resp.success {
                bail!("{} ({})", resp.message, resp.status_code);
            }
            print!("{}", resp.into_data().unwrap_or_default());
        }
        Command::Courses { user_id } => {
            let service = CourseService::new(store);
            match user_id {
                Some(user_id) => finish(service.get_by_user(&user_id))?,
                None => finish(service.get_all())?,
            }
        }
        Command::AddCourse { code, title, instructor } => {
            finish(CourseService::new(store).store_course(&code, &title, &instructor))?;
        }
        Command::Enroll { user_id, course_id, email, role } => {
            let service = CourseService::new(store);
            if let Some(email) = email {
                finish(service.register_user(&user_id, &email, role))?;
            }
            finish(service.store_user_course(&user_id, course_id))?;
        }
        Command::Unenroll { user_id, course_id } => {
            finish(CourseService::new(store).delete_user_course(&user_id, course_id))?;
        }
    }
    Ok(())
}
