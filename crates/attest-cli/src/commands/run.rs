//! Interactive terminal runner for the guided intake flow.

use anyhow::Result;
use attest_application::{AttachmentSource, IntakeUseCase, PollState};
use attest_client::IntakeApiClient;
use attest_core::protocol::{GeneratedReport, StepOutcome};
use attest_core::session::{ProductContext, Progress, Screen};
use attest_infrastructure::JsonDirSummaryCache;
use clap::Args;
use std::io::{self, Write};
use std::sync::Arc;

#[derive(Args)]
pub struct RunArgs {
    /// Identifier of the product being certified
    #[arg(long)]
    pub product_id: String,

    /// Company name sent as product context
    #[arg(long, default_value = "")]
    pub company: String,

    /// Company location sent as product context
    #[arg(long, default_value = "")]
    pub location: String,

    /// Existing certifications, repeatable
    #[arg(long = "certification")]
    pub certifications: Vec<String>,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let backend = Arc::new(IntakeApiClient::try_from_env()?);
    let cache = Arc::new(JsonDirSummaryCache::new()?);

    let product = ProductContext {
        product_id: args.product_id,
        category: String::new(),
        subcategory: String::new(),
        company_name: args.company,
        location: args.location,
        certifications: args.certifications,
    };
    let use_case = IntakeUseCase::new(backend, cache, product);

    'session: loop {
        if use_case.resume().await {
            println!("Found a completed intake for this product.");
            if let Some(report) = use_case.session().await.report() {
                print_report(report);
            }
            return Ok(());
        }

        // Category selection gates the conversational loop. After a failed
        // first fetch the session is already past category selection, so
        // only the start call is retried.
        let mut current = loop {
            if use_case.session().await.screen() == Screen::CategorySelect {
                let category = prompt("Category")?;
                let subcategory = prompt("Subcategory")?;
                if let Err(e) = use_case.select_category(&category, &subcategory).await {
                    println!("{e}");
                    continue;
                }
            }
            match use_case.start().await {
                Ok(outcome) => break outcome,
                Err(e) => println!("Could not start the intake: {e}"),
            }
        };

        println!("Answer each question. Commands: /attach <path>, /insert <n>, /enhance, /apply, /dismiss, /restart, /quit");

        loop {
            let (question, progress) = match &current {
                StepOutcome::Next { question, progress } => (question.clone(), progress.clone()),
                StepOutcome::Complete => break,
            };
            print_question(&question, &progress);

            current = loop {
                let line = prompt(">")?;
                match line.as_str() {
                    "/quit" => return Ok(()),
                    "/restart" => {
                        use_case.restart().await;
                        println!("Session restarted.");
                        continue 'session;
                    }
                    "/enhance" => {
                        match use_case.request_enhancement().await {
                            Some(enhancement) => {
                                for suggestion in &enhancement.suggestions {
                                    println!("  suggestion: {suggestion}");
                                }
                                for missing in &enhancement.missing_info {
                                    println!("  missing: {missing}");
                                }
                                if enhancement.enhanced_answer.is_some() {
                                    println!("  a rewritten answer is available - /apply to use it");
                                }
                            }
                            None => println!("No suggestions available."),
                        }
                    }
                    "/apply" => match use_case.apply_enhancement().await {
                        Ok(()) => println!("Answer replaced: {}", use_case.draft().await.text()),
                        Err(e) => println!("{e}"),
                    },
                    "/dismiss" => use_case.dismiss_enhancement().await,
                    _ if line.starts_with("/attach ") => {
                        attach(&use_case, line.trim_start_matches("/attach ").trim()).await;
                    }
                    _ if line.starts_with("/insert ") => {
                        let index = line.trim_start_matches("/insert ").trim().parse::<usize>();
                        match index {
                            Ok(index) => match use_case.insert_extracted(index).await {
                                Ok(()) => println!("Inserted into your answer."),
                                Err(e) => println!("{e}"),
                            },
                            Err(_) => println!("Usage: /insert <number>"),
                        }
                    }
                    _ => {
                        if !line.is_empty() {
                            use_case.set_answer_text(&line).await;
                        }
                        match use_case.submit_answer().await {
                            Ok(outcome) => break outcome,
                            Err(e) => {
                                // Recoverable: the log and the draft are
                                // kept, the same answer may be resubmitted.
                                println!("Submission failed: {e}");
                            }
                        }
                    }
                }
            };
        }

        println!("\nIntake complete. Waiting for your compliance report...");
        await_report(&use_case).await?;
        return Ok(());
    }
}

async fn attach(use_case: &IntakeUseCase, path: &str) {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            println!("Could not read {path}: {e}");
            return;
        }
    };
    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    match use_case
        .attach_files(vec![AttachmentSource {
            file_name,
            mime_type: None,
            data,
        }])
        .await
    {
        Ok(report) => {
            for file in &report.uploaded {
                println!("Uploaded {}.", file.original_name);
            }
            for failure in &report.failures {
                println!("Failed to upload {}: {}", failure.file_name, failure.error);
            }
            let extracted = use_case.draft().await.extracted().len();
            if extracted > 0 {
                println!("{extracted} extracted snippet(s) available - /insert <n> to use one.");
            }
        }
        Err(e) => println!("{e}"),
    }
}

async fn await_report(use_case: &IntakeUseCase) -> Result<()> {
    // Print interim status lines while the poller works.
    if let Some(mut rx) = use_case.subscribe_poll().await {
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if let PollState::Waiting { message, .. } = &*rx.borrow() {
                    println!("  {message}");
                }
            }
        });
    }

    match use_case.await_report().await? {
        PollState::Ready(report) => print_report(&report),
        PollState::TimedOut => {
            println!("Report generation is taking longer than expected - check back later.");
        }
        PollState::Failed(message) => {
            println!("Could not retrieve the report: {message}");
        }
        PollState::Idle | PollState::Waiting { .. } => {}
    }
    Ok(())
}

fn print_question(question: &str, progress: &Progress) {
    println!();
    if !progress.current_section.is_empty() {
        println!(
            "[{}% overall, {}% {}]",
            progress.overall, progress.section, progress.current_section
        );
    } else {
        println!("[{}% overall]", progress.overall);
    }
    println!("{question}");
}

fn print_report(report: &GeneratedReport) {
    println!();
    println!(
        "=== Compliance report: {} ({}) ===",
        report.product_name, report.company_name
    );
    println!("Category: {}", report.category);
    println!();
    println!("{}", report.summary);
    println!();
    println!("{}", report.fir_report);
}

fn prompt(label: &str) -> Result<String> {
    print!("{label} ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
