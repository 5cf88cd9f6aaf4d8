//! Stand-in wallet for running the dashboard without a browser extension.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use reactions::{EthereumProvider, Wallet, WalletConnector};

pub struct DemoWalletConnector {
    provider: Arc<DemoProvider>,
    init_delay: Duration,
}

impl DemoWalletConnector {
    pub fn new(init_delay: Duration) -> Self {
        Self {
            provider: Arc::new(DemoProvider::default()),
            init_delay,
        }
    }

    fn wallet(&self, ready: bool) -> Wallet {
        let provider: Arc<dyn EthereumProvider> = self.provider.clone();
        Wallet {
            ethereum: Some(provider),
            ready,
        }
    }
}

#[async_trait]
impl WalletConnector for DemoWalletConnector {
    fn detect(&self) -> Wallet {
        self.wallet(false)
    }

    async fn initialize(&self) -> Result<Wallet> {
        tokio::time::sleep(self.init_delay).await;
        Ok(self.wallet(true))
    }
}

#[derive(Default)]
struct DemoProvider {
    enabled: AtomicBool,
}

#[async_trait]
impl EthereumProvider for DemoProvider {
    fn name(&self) -> Option<String> {
        Some("Demo Wallet".to_string())
    }

    fn is_connected(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    async fn enable(&self) -> Result<()> {
        self.enabled.store(true, Ordering::SeqCst);
        Ok(())
    }
}
