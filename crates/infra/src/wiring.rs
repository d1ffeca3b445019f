//! Process wiring: settings, key material and collaborators into a ready
//! [`EventHandler`] and [`AddressConfirmationService`].

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use addrconfirm_confirmation::{
    AddressConfirmationService, EventHandler, LinkBuilder, Notifier, OutcomeSink, PartnerGateway,
    TracingOutcomeSink,
};
use addrconfirm_security::{ConfirmationCipher, RsaConfirmationCipher};

use crate::config::Settings;

/// The two entry points of address confirmation, sharing one gateway and cipher.
pub struct AddressConfirmation {
    pub handler: Arc<EventHandler>,
    pub confirmations: Arc<AddressConfirmationService>,
}

impl AddressConfirmation {
    /// Read settings from the environment, initialize logging and wire.
    pub fn bootstrap(
        gateway: Arc<dyn PartnerGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        addrconfirm_observability::init();

        let settings = Settings::from_env().context("reading address confirmation settings")?;
        info!(
            algorithm = %settings.cipher_algorithm,
            key_source = %settings.key_source,
            link_template = %settings.links.template(),
            "starting address confirmation"
        );
        Self::wire(&settings, gateway, notifier)
    }

    /// Load the key named by `settings` and wire with the tracing outcome sink.
    pub fn wire(
        settings: &Settings,
        gateway: Arc<dyn PartnerGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let cipher = RsaConfirmationCipher::load(settings.cipher_algorithm, &settings.key_source)
            .with_context(|| format!("loading confirmation key from {}", settings.key_source))?;

        Ok(Self::assemble(
            settings.links.clone(),
            gateway,
            notifier,
            Arc::new(cipher),
            Arc::new(TracingOutcomeSink),
        ))
    }

    pub fn assemble(
        links: LinkBuilder,
        gateway: Arc<dyn PartnerGateway>,
        notifier: Arc<dyn Notifier>,
        cipher: Arc<dyn ConfirmationCipher>,
        sink: Arc<dyn OutcomeSink>,
    ) -> Self {
        let handler = EventHandler::new(gateway.clone(), notifier, cipher.clone(), links, sink);
        let confirmations = AddressConfirmationService::new(gateway, cipher);
        Self {
            handler: Arc::new(handler),
            confirmations: Arc::new(confirmations),
        }
    }
}
