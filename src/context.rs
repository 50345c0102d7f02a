use std::{
    fs::{self, create_dir_all, remove_dir_all},
    path::{Path, PathBuf},
};

use crate::config::Config;

/// Where a site lives on disk and how it is configured.
pub struct Context {
    home: PathBuf,
    output_dir: PathBuf,
    pub config: Config,
}

impl Context {
    pub fn new(home: PathBuf, output_dir: PathBuf) -> anyhow::Result<Self> {
        let config = Config::load(&home.join("config.toml"))?;

        Ok(Self::with_config(home, output_dir, config))
    }

    pub fn with_config(home: PathBuf, output_dir: PathBuf, config: Config) -> Self {
        Self {
            home,
            output_dir,
            config,
        }
    }

    pub fn clean_output_dir(&self) -> anyhow::Result<()> {
        if self.output_dir.exists() {
            remove_dir_all(&self.output_dir)?;
        }
        create_dir_all(&self.output_dir)?;
        Ok(())
    }

    pub fn absolute<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.home.join(path.as_ref())
    }

    pub fn relative(&self, path: &Path) -> anyhow::Result<PathBuf> {
        Ok(path.strip_prefix(&self.home)?.into())
    }

    fn create_output_dir(&self, path: &Path) -> anyhow::Result<()> {
        let output = self.output_dir.join(path);
        Ok(fs::create_dir_all(output)?)
    }

    pub fn copy_to_output(&self, file: &Path, path: &Path) -> anyhow::Result<()> {
        path.parent()
            .map(|p| self.create_output_dir(p))
            .transpose()?;

        let output = self.output_dir.join(path);

        fs::copy(file, output)?;

        Ok(())
    }

    pub fn write_to_output(&self, path: &Path, contents: &str) -> anyhow::Result<()> {
        path.parent()
            .map(|p| self.create_output_dir(p))
            .transpose()?;

        let output = self.output_dir.join(path);

        fs::write(output, contents)?;

        Ok(())
    }
}
