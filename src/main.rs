use std::collections::HashMap;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use reclaim_verifier::config::HostConfig;
use reclaim_verifier::routes::{build_router, AppState};
use reclaim_verifier::{
    Completer, CompletionRegistry, DisplayHost, SessionContext, SurfaceId, VerificationError,
    VerificationOptions, VerificationRequest, Verifier, WebhookEngine,
};

/// Uses the controlling terminal as the verification surface. Ctrl-C while a
/// surface is open counts as the user dismissing it.
struct TerminalDisplay {
    port: u16,
    next_id: AtomicU64,
    watchers: Mutex<HashMap<SurfaceId, tokio::task::JoinHandle<()>>>,
}

impl TerminalDisplay {
    fn new(port: u16) -> Self {
        Self {
            port,
            next_id: AtomicU64::new(1),
            watchers: Mutex::new(HashMap::new()),
        }
    }
}

impl DisplayHost for TerminalDisplay {
    fn present(
        &self,
        ctx: &SessionContext,
        completer: Completer,
    ) -> Result<SurfaceId, VerificationError> {
        if !std::io::stdin().is_terminal() {
            return Err(VerificationError::PresentationUnavailable);
        }

        let surface = SurfaceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                completer.complete(Err(VerificationError::Dismissed));
            }
        });
        self.watchers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(surface, watcher);

        println!("Verification session {} started.", ctx.session_id());
        println!(
            "Deliver the result to http://127.0.0.1:{}/sessions/{}/complete (Ctrl-C to dismiss)",
            self.port,
            ctx.session_id()
        );
        Ok(surface)
    }

    fn dismiss(&self, surface: SurfaceId) {
        let watcher = self
            .watchers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&surface);
        if let Some(watcher) = watcher {
            watcher.abort();
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reclaim_verifier=info".into()),
        )
        .init();

    let config = HostConfig::from_env();
    if config.provider_id.is_empty() {
        tracing::error!("RECLAIM_PROVIDER_ID is not set");
        std::process::exit(2);
    }

    let app_config = config.app_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load app configuration: {}", e);
        std::process::exit(2);
    });

    let options = VerificationOptions::default()
        .with_webhook_url(format!("http://127.0.0.1:{}/sessions", config.port));
    let request = VerificationRequest::from_config(&*app_config, &config.provider_id, options)
        .unwrap_or_else(|e| {
            tracing::error!("Failed to create verification request: {}", e);
            std::process::exit(2);
        });

    let registry = CompletionRegistry::new();
    let app = build_router(Arc::new(AppState {
        registry: registry.clone(),
    }));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            panic!("Failed to bind to {}: {}", addr, e);
        });
    tracing::info!("Webhook listener on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Webhook server error: {}", e);
        }
    });

    let verifier = Verifier::new(
        Arc::new(WebhookEngine::new(registry)),
        Arc::new(TerminalDisplay::new(config.port)),
    )
    .with_settings(config.verifier.clone());

    match verifier.start_verification(request).await {
        Ok(proof) => {
            let rendered = serde_json::to_string_pretty(&proof.response)
                .unwrap_or_else(|_| proof.response.to_string());
            println!("Result: {}", rendered);
        }
        Err(e) => {
            tracing::info!("Verification failure details: {}", e);
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}
