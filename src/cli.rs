use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::backend::BackendClient;
use crate::config::Config;
use crate::domain::Quote;
use crate::services::{CheckoutService, ReturnSlots};

#[derive(Parser)]
#[command(name = "reservation-core")]
#[command(about = "Reservation Core - booking quotes, checkout and payment return handling", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Price a stay against the live unit and the configured fees
    Quote {
        /// Unit identifier
        #[arg(short, long)]
        unit: String,

        /// Check-in date (YYYY-MM-DD)
        #[arg(long)]
        check_in: NaiveDate,

        /// Check-out date (YYYY-MM-DD)
        #[arg(long)]
        check_out: NaiveDate,

        /// Number of guests
        #[arg(short, long, default_value_t = 1)]
        guests: u32,
    },

    /// Configuration validation
    Config,
}

pub async fn handle_quote(
    config: &Config,
    unit: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: u32,
) -> anyhow::Result<()> {
    let backend = BackendClient::from_config(config)?;
    let service = CheckoutService::new(
        Arc::new(backend),
        config.fees.clone(),
        ReturnSlots::new(config.default_return_location.clone()),
    );

    let quote = service
        .quote_stay(unit, check_in, check_out, guests)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()).context(e.to_string()))?;

    print!("{}", format_quote(&quote));
    Ok(())
}

pub fn format_quote(quote: &Quote) -> String {
    let rows = [
        (
            format!("{} x {} nights", quote.nightly_rate, quote.nights),
            &quote.subtotal,
        ),
        ("Cleaning fee".to_string(), &quote.cleaning_fee),
        ("Service fee".to_string(), &quote.service_fee),
        ("Taxes".to_string(), &quote.taxes),
    ];

    let mut out = format!(
        "Unit {} | {} -> {} | {} guest(s)\n",
        quote.property_id, quote.check_in, quote.check_out, quote.guest_count
    );
    out.push_str(&"-".repeat(48));
    out.push('\n');
    for (label, amount) in rows {
        out.push_str(&format!("{:<32} {} {}\n", label, quote.currency, amount));
    }
    out.push_str(&"-".repeat(48));
    out.push('\n');
    out.push_str(&format!("{:<32} {} {}\n", "Total", quote.currency, quote.total));
    out
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Backend URL: {}", config.backend_base_url);
    println!(
        "  Backend Token: {}",
        config
            .backend_api_token
            .as_deref()
            .map(mask_secret)
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!("  Backend Timeout: {}s", config.backend_timeout_secs);
    println!(
        "  Circuit Breaker: {} failures, {}s reset",
        config.breaker_failure_threshold, config.breaker_reset_secs
    );
    println!("  Payment Provider: {}", config.payment_provider);
    println!("  Cleaning Fee: {}", config.fees.cleaning_fee);
    println!("  Service Fee Rate: {}", config.fees.service_fee_rate);
    println!("  Tax Rate: {}", config.fees.tax_rate);
    println!("  Return Redirect Delay: {}ms", config.return_redirect_delay_ms);
    println!("  Default Return Location: {}", config.default_return_location);

    url::Url::parse(&config.backend_base_url)
        .map_err(|e| anyhow::anyhow!("BACKEND_BASE_URL is not a valid URL: {}", e))?;

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        return "****".to_string();
    }
    format!("{}****", visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{compute_quote, FeeSchedule, Property};
    use bigdecimal::BigDecimal;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abcd1234"), "abcd****");
        assert_eq!(mask_secret("abc"), "****");
    }

    #[test]
    fn test_format_quote_lists_total() {
        let property = Property {
            id: "unit-1".to_string(),
            title: "Casa".to_string(),
            address: None,
            nightly_rate: BigDecimal::from(100),
            currency: "PEN".to_string(),
            max_guests: None,
        };
        let quote = compute_quote(
            &property,
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
            2,
            &FeeSchedule::default(),
        )
        .unwrap();

        let text = format_quote(&quote);
        assert!(text.contains("100 x 7 nights"));
        assert!(text.lines().last().unwrap().starts_with("Total"));
    }

    #[test]
    fn test_cli_parses_quote_command() {
        let cli = Cli::parse_from([
            "reservation-core",
            "quote",
            "--unit",
            "unit-1",
            "--check-in",
            "2026-03-01",
            "--check-out",
            "2026-03-08",
            "--guests",
            "2",
        ]);

        match cli.command {
            Some(Commands::Quote { unit, guests, .. }) => {
                assert_eq!(unit, "unit-1");
                assert_eq!(guests, 2);
            }
            _ => panic!("expected quote command"),
        }
    }
}
