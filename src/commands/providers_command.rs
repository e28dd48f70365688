//! List the tile sources a request can name

use clap::ArgMatches;

use crate::commands::command_traits::Command;
use crate::config::MosaicConfig;
use crate::errors::MosaicResult;
use crate::tiles::{list_providers, NamedProvider, ProviderCatalog};

pub struct ProvidersCommand {
    catalog: ProviderCatalog,
    free_only: bool,
    verbose: bool,
}

impl ProvidersCommand {
    pub fn new(args: &ArgMatches, config: &MosaicConfig) -> MosaicResult<Self> {
        Ok(ProvidersCommand {
            catalog: config.provider_catalog()?,
            free_only: config.catalog.free_only && !args.get_flag("all"),
            verbose: args.get_flag("urls"),
        })
    }

    /// One line per source, optionally with its URL template and attribution
    pub fn lines(&self) -> Vec<String> {
        list_providers(&self.catalog, self.free_only).into_iter()
            .map(|name| {
                if !self.verbose {
                    return name;
                }
                if let Some(provider) = NamedProvider::from_name(&name) {
                    return format!("{:<32} {}", name, provider.template());
                }
                match self.catalog.get(&name, false) {
                    Some(entry) => match &entry.attribution {
                        Some(attribution) => format!("{:<32} {}  [{}]", name, entry.url, attribution),
                        None => format!("{:<32} {}", name, entry.url),
                    },
                    None => name,
                }
            })
            .collect()
    }
}

impl Command for ProvidersCommand {
    fn execute(&self) -> MosaicResult<()> {
        for line in self.lines() {
            println!("{}", line);
        }
        Ok(())
    }
}
