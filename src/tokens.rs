//! Solana token table, amount conversion and service pricing

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::{NoLimitError, Result};

/// Wrapped SOL mint
pub const NATIVE_SOL: &str = "So11111111111111111111111111111111111111112";
/// USDC mint
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
/// USDT mint
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

/// Tokens supported by the noLimit services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Sol,
    Usdc,
    Usdt,
}

impl Token {
    pub const ALL: [Token; 3] = [Token::Sol, Token::Usdc, Token::Usdt];

    /// Mint address
    pub fn mint(&self) -> &'static str {
        match self {
            Token::Sol => NATIVE_SOL,
            Token::Usdc => USDC_MINT,
            Token::Usdt => USDT_MINT,
        }
    }

    pub fn decimals(&self) -> u32 {
        match self {
            Token::Sol => 9,
            Token::Usdc | Token::Usdt => 6,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Token::Sol => "SOL",
            Token::Usdc => "USDC",
            Token::Usdt => "USDT",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Token::Sol => "Solana",
            Token::Usdc => "USD Coin",
            Token::Usdt => "Tether USD",
        }
    }

    /// Look a token up by its mint address
    pub fn from_mint(mint: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.mint() == mint)
    }
}

impl FromStr for Token {
    type Err = NoLimitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SOL" => Ok(Token::Sol),
            "USDC" => Ok(Token::Usdc),
            "USDT" => Ok(Token::Usdt),
            _ => Err(NoLimitError::validation(format!("Unknown token: {}", s))),
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Resolve a symbol to its mint; anything else is assumed to already be a mint
pub fn resolve_mint(symbol_or_mint: &str) -> String {
    symbol_or_mint
        .parse::<Token>()
        .map(|t| t.mint().to_string())
        .unwrap_or_else(|_| symbol_or_mint.to_string())
}

/// Decimals for a symbol or mint; unknown tokens default to 6
pub fn decimals_for(symbol_or_mint: &str) -> u32 {
    symbol_or_mint
        .parse::<Token>()
        .ok()
        .or_else(|| Token::from_mint(symbol_or_mint))
        .map(|t| t.decimals())
        .unwrap_or(6)
}

/// Convert a human amount ("1.5") to atomic units ("1500000" at 6 decimals).
///
/// Fraction digits beyond `decimals` are truncated.
pub fn parse_amount(amount: &str, decimals: u32) -> Result<String> {
    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));

    let valid = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !valid(whole) || !valid(fraction) {
        return Err(NoLimitError::validation(format!("Invalid amount: {:?}", amount)));
    }

    let width = decimals as usize;
    let mut digits = String::with_capacity(whole.len() + width);
    digits.push_str(whole);
    digits.extend(fraction.chars().chain(std::iter::repeat('0')).take(width));

    let trimmed = digits.trim_start_matches('0');
    Ok(if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    })
}

/// Convert atomic units back to a human amount, stripping trailing zeros
pub fn format_amount(atomic: &str, decimals: u32) -> Result<String> {
    if atomic.is_empty() || !atomic.chars().all(|c| c.is_ascii_digit()) {
        return Err(NoLimitError::validation(format!("Invalid atomic amount: {:?}", atomic)));
    }

    let width = decimals as usize;
    let padded = format!("{:0>width$}", atomic, width = width + 1);
    let (whole, fraction) = padded.split_at(padded.len() - width);
    let whole = whole.trim_start_matches('0');
    let whole = if whole.is_empty() { "0" } else { whole };
    let fraction = fraction.trim_end_matches('0');

    Ok(if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    })
}

/// Service pricing, in USDC
pub mod pricing {
    use rust_decimal::Decimal;

    pub fn chat() -> Decimal {
        Decimal::new(5, 2)
    }

    pub fn swap() -> Decimal {
        Decimal::new(10, 2)
    }

    pub fn mixer_base() -> Decimal {
        Decimal::new(75, 3)
    }

    /// Mixer fee as a percentage of the mixed amount
    pub fn mixer_percent() -> Decimal {
        Decimal::ONE
    }
}

/// Split a mix amount into the 1% mixer fee and what the recipient receives
pub fn mixer_fee(amount: &str) -> Result<(Decimal, Decimal)> {
    let value = Decimal::from_str(amount.trim())
        .map_err(|_| NoLimitError::validation(format!("Invalid amount: {:?}", amount)))?;
    if value.is_sign_negative() {
        return Err(NoLimitError::validation("Amount must not be negative"));
    }

    let fee = value * pricing::mixer_percent() / Decimal::ONE_HUNDRED;
    Ok((fee.normalize(), (value - fee).normalize()))
}
