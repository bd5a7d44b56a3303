//! `eaptrust connect` - replay one connection attempt through the handler.
//!
//! The server chain comes from a PEM bundle, prompts are answered in the
//! terminal (or automatically), and the network store is saved back to the
//! state file so the next run sees the outcome.

use anyhow::Result;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use serde::Serialize;
use tracing::{debug, info};

use eaptrust::{
    load_pem_chain, EnterpriseConfig, HandlerConfig, MemoryNetworkStore, NetworkConfig,
    Preparation, PromptKind, PromptReply, QueuedPrompt, RecordingSession, ServerCertificate,
    ShownPrompt, ShownRequest, TapAction, TofuTrustHandler, TrustDecision,
};

use super::Context;
use crate::cli::args::{AutoAnswer, ConnectArgs};
use crate::output::{print_json, OutputFormat};

type CliHandler =
    TofuTrustHandler<MemoryNetworkStore, RecordingSession, QueuedPrompt, Vec<TrustDecision>>;

// Tap and Link each open one more prompt; anything longer is a loop.
const MAX_PROMPT_ROUNDS: usize = 8;

#[derive(Debug, Clone, Copy)]
struct Attempt {
    preparation: Preparation,
    certificates_accepted: usize,
}

#[derive(Debug, Serialize)]
struct ConnectReport {
    ssid: String,
    network_id: i32,
    preparation: String,
    certificates_accepted: usize,
    prompts: Vec<String>,
    decision: Option<TrustDecision>,
    native_calls: Vec<String>,
    state_file: String,
}

pub async fn execute(ctx: Context, args: ConnectArgs) -> Result<()> {
    let handler_config = HandlerConfig::load(&ctx.handler_config)?;
    let state_path = args.state.clone().unwrap_or_else(|| ctx.state_file.clone());
    let store = MemoryNetworkStore::load(&state_path)?;

    let mut certs = load_pem_chain(&args.chain).await?;
    if args.reverse {
        certs.reverse();
    }

    let mut network = network_config(&args);
    store.apply_to(&mut network);
    info!(ssid = %network.ssid, network_id = network.network_id, certs = certs.len(), "replaying connection");

    let mut handler = TofuTrustHandler::new(
        handler_config,
        store,
        RecordingSession::default(),
        QueuedPrompt::default(),
        Vec::new(),
    );

    let user_selected = !args.background;
    let attempt = match args.auto {
        Some(answer) => drive(&mut handler, &mut network, certs, user_selected, |shown| {
            Ok(Some(auto_reply(shown.request.token().kind, answer)))
        })?,
        None => drive(&mut handler, &mut network, certs, user_selected, ask_user)?,
    };

    let (store, native, prompt, decisions) = handler.into_parts();
    store.save(&state_path)?;
    debug!(path = %state_path.display(), "saved network state");

    let report = ConnectReport {
        ssid: network.ssid.clone(),
        network_id: network.network_id,
        preparation: format!("{:?}", attempt.preparation),
        certificates_accepted: attempt.certificates_accepted,
        prompts: prompt
            .shown()
            .iter()
            .map(|p| format!("{:?}", p.request.token().kind))
            .collect(),
        decision: decisions.last().cloned(),
        native_calls: native.calls().iter().map(|c| format!("{c:?}")).collect(),
        state_file: state_path.display().to_string(),
    };

    match ctx.output_format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Pretty => print_report(&report, ctx.verbose),
    }
    Ok(())
}

fn network_config(args: &ConnectArgs) -> NetworkConfig {
    let mut ent = EnterpriseConfig::new(args.eap, args.phase2);
    ent.identity.clone_from(&args.identity);
    ent.password.clone_from(&args.password);
    ent.trust_on_first_use = !args.no_tofu;
    NetworkConfig::enterprise(args.network_id, args.ssid.clone(), ent)
}

/// Run prepare, certificate delivery, approval and prompt replies in order.
///
/// `answer` returns `None` to walk away from a prompt, which tears the
/// attempt down without a decision.
fn drive<F>(
    handler: &mut CliHandler,
    network: &mut NetworkConfig,
    certs: Vec<ServerCertificate>,
    user_selected: bool,
    mut answer: F,
) -> Result<Attempt>
where
    F: FnMut(&ShownPrompt) -> Result<Option<PromptReply>>,
{
    let preparation = handler.prepare_connection(network);
    let mut certificates_accepted = 0;
    if preparation == Preparation::Gated {
        for (depth, cert) in certs.into_iter().enumerate() {
            if handler.add_pending_certificate(&network.ssid, i32::try_from(depth)?, cert) {
                certificates_accepted += 1;
            }
        }
    }

    handler.start_user_approval_if_necessary(user_selected);

    for _ in 0..MAX_PROMPT_ROUNDS {
        let Some(token) = handler.active_prompt().cloned() else {
            break;
        };
        let Some(shown) = handler.prompt().outstanding().cloned() else {
            break;
        };
        match answer(&shown)? {
            Some(reply) => handler.handle_prompt_reply(&token, reply),
            None => break,
        }
    }
    if handler.active_prompt().is_some() {
        handler.cleanup();
    }

    Ok(Attempt {
        preparation,
        certificates_accepted,
    })
}

fn auto_reply(kind: PromptKind, answer: AutoAnswer) -> PromptReply {
    match kind {
        PromptKind::TofuNotification => PromptReply::Tap,
        k if k.is_informational() => PromptReply::Accept,
        _ => match answer {
            AutoAnswer::Accept => PromptReply::Accept,
            AutoAnswer::Reject => PromptReply::Reject,
        },
    }
}

/// Terminal choices for a prompt. `None` walks away.
fn choices(request: &ShownRequest) -> Vec<(String, Option<PromptReply>)> {
    let mut choices = Vec::new();
    match request {
        ShownRequest::Dialog(d) => {
            if let Some(text) = &d.positive_text {
                choices.push((text.clone(), Some(PromptReply::Accept)));
            }
            if let Some(text) = &d.negative_text {
                choices.push((text.clone(), Some(PromptReply::Reject)));
            }
            if let Some(text) = &d.neutral_text {
                choices.push((text.clone(), Some(PromptReply::Neutral)));
            }
            if let Some(link) = &d.link {
                choices.push((format!("{} ({})", link.text, link.url), Some(PromptReply::Link)));
            }
        }
        ShownRequest::Notification(n) => {
            if n.tap == TapAction::Reply {
                choices.push(("Open".to_string(), Some(PromptReply::Tap)));
            }
            if let Some(text) = &n.accept_text {
                choices.push((text.clone(), Some(PromptReply::Accept)));
            }
            if let Some(text) = &n.reject_text {
                choices.push((text.clone(), Some(PromptReply::Reject)));
            }
            if n.token.kind.is_informational() {
                choices.push(("Dismiss".to_string(), Some(PromptReply::Cancel)));
            } else {
                choices.push(("Ignore".to_string(), None));
            }
        }
    }
    choices
}

fn ask_user(shown: &ShownPrompt) -> Result<Option<PromptReply>> {
    let (title, message) = match &shown.request {
        ShownRequest::Dialog(d) => (&d.title, &d.message),
        ShownRequest::Notification(n) => (&n.title, &n.message),
    };
    println!();
    println!("{}", title.bold());
    println!("{message}");
    if let ShownRequest::Notification(n) = &shown.request {
        if let TapAction::OpenUrl(url) = &n.tap {
            println!("{} {}", "Help:".dimmed(), url);
        }
    }

    let choices = choices(&shown.request);
    let labels: Vec<&str> = choices.iter().map(|(label, _)| label.as_str()).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Choose")
        .items(&labels)
        .default(0)
        .interact_opt()?;

    // Escape closes the prompt the way a back press would.
    Ok(match selection {
        Some(index) => choices.get(index).and_then(|(_, reply)| *reply),
        None => Some(PromptReply::Cancel),
    })
}

fn print_report(report: &ConnectReport, verbose: bool) {
    println!();
    println!("{} {} (network {})", "Network:".bold(), report.ssid, report.network_id);
    println!("  {} {}", "preparation:".dimmed(), report.preparation);
    println!("  {} {}", "certificates:".dimmed(), report.certificates_accepted);
    if !report.prompts.is_empty() {
        println!("  {} {}", "prompts:".dimmed(), report.prompts.join(" -> "));
    }
    if verbose {
        for call in &report.native_calls {
            println!("  {} {}", "native:".dimmed(), call);
        }
    }

    let decision = match &report.decision {
        Some(d @ TrustDecision::Accept(_)) => d.to_string().green().bold(),
        Some(d @ TrustDecision::Reject(_)) => d.to_string().yellow().bold(),
        Some(d @ TrustDecision::Error(_)) => d.to_string().red().bold(),
        None => "no decision".dimmed(),
    };
    println!("  {} {}", "decision:".dimmed(), decision);
    println!("  {} {}", "state:".dimmed(), report.state_file);
}
