//! Keys command: manage the master secret.

use obs_config::Config;
use obs_crypto::MasterSecret;

use crate::config_bridge::{self, SecretSource};
use crate::theme::Theme;

/// Show the key id of the active master secret, creating it if needed.
pub(crate) fn show_key(cfg: &Config) -> anyhow::Result<()> {
    let source = config_bridge::secret_source(cfg)?;
    if let SecretSource::File(path) = &source
        && !path.exists()
    {
        println!("{}", Theme::info("No master secret found. Generating one..."));
    }

    let secret = config_bridge::load_master_secret(cfg)?;

    println!("\n{}", Theme::header("Master Secret"));
    println!("{}", Theme::field("Key ID", &secret.key_id_hex()));
    println!("{}", Theme::field("Source", &describe(&source)));
    println!();

    Ok(())
}

/// Generate a new master secret file, with confirmation if one exists.
pub(crate) fn generate_key(cfg: &Config, force: bool) -> anyhow::Result<()> {
    let path = match config_bridge::secret_source(cfg)? {
        SecretSource::Inline => {
            println!(
                "{}",
                Theme::warning("keys.master_secret is set inline; remove it to use a key file.")
            );
            return Ok(());
        },
        SecretSource::File(path) => path,
    };

    if path.exists() && !force {
        println!(
            "{}",
            Theme::warning("A master secret already exists. This will replace it.")
        );
        println!(
            "{}",
            Theme::warning("Every credential issued so far will stop verifying.")
        );
        println!();

        let confirm = dialoguer::Confirm::new()
            .with_prompt("Replace existing master secret?")
            .default(false)
            .interact()?;

        if !confirm {
            println!("{}", Theme::info("Aborted."));
            return Ok(());
        }
    }

    let secret = MasterSecret::generate()?;
    secret.persist(&path, true)?;

    println!("{}", Theme::success("New master secret generated."));
    println!("{}", Theme::field("Key ID", &secret.key_id_hex()));
    println!("{}", Theme::field("Key file", &path.display().to_string()));
    println!();

    Ok(())
}

fn describe(source: &SecretSource) -> String {
    match source {
        SecretSource::Inline => "inline (keys.master_secret)".to_owned(),
        SecretSource::File(path) => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_generate_replaces_secret_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.key");
        let mut cfg = Config::default();
        cfg.keys.master_secret_path = Some(path.display().to_string());

        let old = config_bridge::load_master_secret(&cfg).unwrap();
        generate_key(&cfg, true).unwrap();
        let new = config_bridge::load_master_secret(&cfg).unwrap();

        assert_ne!(old.key_id(), new.key_id());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
