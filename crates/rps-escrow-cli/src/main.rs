//! Compute the commitment a player submits before revealing.
//!
//! Usage: hashed-move --type 2 --secret "my secret"
//!        hashed-move --type rock --salt 0x<64 hex digits>
//!
//! With neither a secret nor a salt, a random salt is drawn and printed to
//! stderr so the move can be revealed later.

use clap::Parser;
use rps_escrow_core::{Commitment, Move, Salt};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hashed-move")]
#[command(about = "Hash a move with a salt into a commitment")]
struct Args {
    /// Move to commit: 1 = rock, 2 = paper, 3 = scissors
    #[arg(short = 't', long = "type")]
    mv: Move,

    /// Secret the salt is derived from (keccak256 of its UTF-8 bytes)
    #[arg(long, env = "RPS_SALT_SECRET")]
    secret: Option<String>,

    /// Raw 32-byte salt as hex; takes precedence over a secret
    #[arg(long)]
    salt: Option<Salt>,
}

impl Args {
    /// The salt to hash with, and whether it was freshly generated
    fn resolve_salt(&self) -> (Salt, bool) {
        match (&self.salt, &self.secret) {
            (Some(salt), _) => (salt.clone(), false),
            (None, Some(secret)) => (Salt::from_secret(secret), false),
            (None, None) => (Salt::random(), true),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (salt, generated) = args.resolve_salt();
    debug!("Hashing {} (code {})", args.mv, args.mv.code());

    if generated {
        eprintln!("salt: 0x{}", hex::encode(salt.as_bytes()));
    }
    println!("{}", Commitment::new(args.mv, &salt));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("hashed-move").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_secret_salt_matches_known_commitment() {
        let args = parse(&["--type", "2", "--secret", "4rk0zt1m9"]);
        let (salt, generated) = args.resolve_salt();

        assert!(!generated);
        assert_eq!(
            Commitment::new(args.mv, &salt).to_string(),
            "0xd4450f7183cfcb6196c10b31d2cf77ce529b22897cac73d849c74a8fdcada98a"
        );
    }

    #[test]
    fn test_raw_salt() {
        let zero = format!("0x{}", "00".repeat(32));
        let args = parse(&["-t", "rock", "--salt", &zero]);
        let (salt, _) = args.resolve_salt();

        assert_eq!(
            Commitment::new(args.mv, &salt).to_string(),
            "0x0d678e31a4b2825b806fe160675cd01dab159802c7f94397ce45ed91b5f3aac6"
        );
    }

    #[test]
    fn test_rejects_unknown_move() {
        let result = Args::try_parse_from(["hashed-move", "--type", "4", "--secret", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_short_salt() {
        let result = Args::try_parse_from(["hashed-move", "--type", "1", "--salt", "0xabcd"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_raw_salt_wins_over_secret() {
        let zero = "00".repeat(32);
        let args = parse(&["--type", "1", "--secret", "s", "--salt", &zero]);
        assert_eq!(args.resolve_salt().0, Salt::from_bytes([0; 32]));
    }
}
