//! Runs the parsed command against the registry

use crate::cli::args::{Args, Command};
use crate::config::AppConfig;
use crate::error::{RegistryError, Result};
use crate::image::digest::DescriptorDigest;
use crate::image::manifest::ManifestPayload;
use crate::logging::Logger;
use crate::registry::RegistryClient;
use std::path::Path;

pub struct Runner {
    args: Args,
    logger: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Result<Self> {
        let logger = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };

        Ok(Self { args, logger })
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn run(&self) -> Result<()> {
        self.logger.section("Registry Endpoints");
        self.args.validate()?;

        let config = AppConfig::new(
            self.args.command.repository_url(),
            self.args.username.clone(),
            self.args.password.clone(),
            self.args.skip_tls,
            self.args.timeout,
            self.args.verbose,
        )?;
        self.logger.info(&format!(
            "Repository: {}/{}",
            config.registry.host(),
            config.registry.repository
        ));
        if !config.has_auth() {
            self.logger.detail("No credentials provided, sending anonymous requests");
        }

        let client = RegistryClient::from_config(&config, self.logger.clone())?;

        match &self.args.command {
            Command::PushManifest { file, .. } => {
                self.push_manifest(&client, &config, file).await?
            }
            Command::PullManifest { output, .. } => {
                self.pull_manifest(&client, &config, output.as_deref()).await?
            }
            Command::CheckBlob { digest, .. } => self.check_blob(&client, digest).await?,
        }

        self.logger.success(&format!(
            "{} completed in {}",
            self.args.command.name(),
            self.logger.format_duration(self.logger.elapsed())
        ));
        Ok(())
    }

    async fn push_manifest(
        &self,
        client: &RegistryClient,
        config: &AppConfig,
        file: &Path,
    ) -> Result<()> {
        self.logger.subsection("Pushing manifest");

        let data = tokio::fs::read(file).await.map_err(|e| {
            RegistryError::Validation(format!(
                "Cannot read manifest file {}: {}",
                file.display(),
                e
            ))
        })?;
        let manifest = ManifestPayload::parse(data)?;
        self.logger.info(&format!(
            "Manifest: {} ({}, {})",
            file.display(),
            manifest.media_type(),
            self.logger.format_size(manifest.len() as u64)
        ));

        let digest = client.push_manifest(&manifest, &config.registry.tag).await?;
        self.logger.summary_kv(
            "Pushed",
            &[
                ("Tag", config.registry.tag.clone()),
                ("Digest", digest.to_string()),
                ("Media type", manifest.media_type().to_string()),
            ],
        );
        Ok(())
    }

    async fn pull_manifest(
        &self,
        client: &RegistryClient,
        config: &AppConfig,
        output: Option<&Path>,
    ) -> Result<()> {
        self.logger.subsection("Pulling manifest");

        let manifest = client.pull_manifest(&config.registry.tag).await?;
        let payload = manifest.payload();
        self.logger.info(&format!(
            "Received {} with {} layer(s), digest {}",
            payload.media_type(),
            manifest.template().layer_digests().len(),
            payload.digest()
        ));

        match output {
            Some(path) => {
                tokio::fs::write(path, payload.bytes()).await?;
                self.logger.success(&format!("Manifest written to {}", path.display()));
            }
            None => println!("{}", String::from_utf8_lossy(payload.bytes())),
        }
        Ok(())
    }

    async fn check_blob(&self, client: &RegistryClient, digest: &str) -> Result<()> {
        self.logger.subsection("Checking blob");

        let digest: DescriptorDigest = digest.parse()?;
        match client.check_blob(&digest).await? {
            Some(descriptor) => self.logger.success(&format!(
                "Blob {} exists ({})",
                digest,
                self.logger.format_size(descriptor.size)
            )),
            None => self.logger.warning(&format!("Blob {} not found", digest)),
        }
        Ok(())
    }
}
