//! `eaptrust inspect` - decode and check a server certificate chain.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use eaptrust::prompt::signature_excerpt;
use eaptrust::{load_pem_chain, CertChain, ServerCertificate};

use super::Context;
use crate::cli::args::InspectArgs;
use crate::output::{print_json, yes_no, OutputFormat};

#[derive(Debug, Serialize)]
struct CertSummary {
    depth: u32,
    subject: String,
    issuer: String,
    common_name: String,
    organization: String,
    is_ca: bool,
    self_signed: bool,
    signature: String,
    fingerprint: String,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    source: String,
    certificates: Vec<CertSummary>,
    valid: bool,
    error: Option<String>,
}

pub async fn execute(ctx: Context, args: InspectArgs) -> Result<()> {
    let mut certs = load_pem_chain(&args.chain).await?;
    if args.reverse {
        certs.reverse();
    }
    let report = build_report(args.chain.display().to_string(), certs)?;

    match ctx.output_format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Pretty => print_report(&report),
    }
    Ok(())
}

fn build_report(source: String, certs: Vec<ServerCertificate>) -> Result<InspectReport> {
    let mut chain = CertChain::new();
    for (depth, cert) in certs.into_iter().enumerate() {
        chain.insert(u32::try_from(depth)?, cert)?;
    }

    let certificates = chain
        .iter()
        .map(|entry| CertSummary {
            depth: entry.depth,
            subject: entry.cert.subject().to_string(),
            issuer: entry.cert.issuer().to_string(),
            common_name: entry.subject.common_name.clone(),
            organization: entry.subject.organization.clone(),
            is_ca: entry.cert.is_ca(),
            self_signed: entry.cert.is_self_signed(),
            signature: signature_excerpt(entry.cert.signature()),
            fingerprint: entry.cert.fingerprint().to_string(),
        })
        .collect();

    let error = chain.validate().err().map(|e| e.to_string());
    Ok(InspectReport {
        source,
        certificates,
        valid: error.is_none(),
        error,
    })
}

fn print_report(report: &InspectReport) {
    println!("{} {}", "Chain:".bold(), report.source);
    println!();

    for cert in &report.certificates {
        let role = match cert.depth {
            0 => "server",
            d if d as usize + 1 == report.certificates.len() => "root",
            _ => "intermediate",
        };
        println!(
            "  {} {} ({})",
            format!("[{}]", cert.depth).cyan(),
            cert.common_name.bold(),
            role.dimmed()
        );
        println!("      {} {}", "subject:".dimmed(), cert.subject);
        println!("      {} {}", "issuer:".dimmed(), cert.issuer);
        if !cert.organization.is_empty() {
            println!("      {} {}", "organization:".dimmed(), cert.organization);
        }
        println!(
            "      {} {}  {} {}",
            "CA:".dimmed(),
            yes_no(cert.is_ca),
            "self-signed:".dimmed(),
            yes_no(cert.self_signed)
        );
        println!("      {} {}", "signature:".dimmed(), cert.signature);
        println!("      {} {}", "sha256:".dimmed(), cert.fingerprint);
    }

    println!();
    match &report.error {
        None => println!("{} chain is complete and anchored", "OK:".green().bold()),
        Some(e) => println!("{} {}", "Invalid:".red().bold(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(subject: &str, issuer: &str, ca: bool) -> ServerCertificate {
        ServerCertificate::from_parts(
            format!("CN={subject}"),
            format!("CN={issuer}"),
            vec![0xab; 12],
            ca,
        )
    }

    #[test]
    fn report_for_valid_chain() {
        let report = build_report(
            "chain.pem".into(),
            vec![cert("radius", "root", false), cert("root", "root", true)],
        )
        .unwrap();
        assert!(report.valid);
        assert_eq!(report.certificates.len(), 2);
        assert!(report.certificates[1].self_signed);
        assert_eq!(report.certificates[0].signature, "abababababababab");
    }

    #[test]
    fn report_carries_validation_error() {
        let report = build_report(
            "chain.pem".into(),
            vec![cert("radius", "other", false), cert("root", "root", true)],
        )
        .unwrap();
        assert!(!report.valid);
        assert!(report.error.is_some());
    }

    #[test]
    fn nameless_certificate_fails() {
        let nameless = ServerCertificate::from_parts("O=x", "O=x", vec![1], false);
        assert!(build_report("c.pem".into(), vec![nameless]).is_err());
    }
}
