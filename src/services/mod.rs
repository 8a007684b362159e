//! Long-running service framework
//!
//! Every background piece of Subfleet (update polling, job answer delivery)
//! implements `Service` and is driven by the `ServiceManager`, which owns the
//! shared shutdown signal and starts/stops services in priority order.

mod health;

pub use health::ServiceHealth;

use crate::logger::{self, LogTag};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Core service trait that all services must implement
#[async_trait]
pub trait Service: Send + Sync {
    /// Unique service identifier
    fn name(&self) -> &'static str;

    /// Service priority (lower = starts earlier, stops later)
    fn priority(&self) -> i32 {
        100
    }

    /// Initialize the service
    async fn initialize(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// Start the service, returning its spawned task handles
    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String>;

    /// Stop the service
    async fn stop(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// Check service health
    async fn health(&self) -> ServiceHealth {
        ServiceHealth::Healthy
    }
}

pub struct ServiceManager {
    services: Vec<Box<dyn Service>>,
    handles: HashMap<&'static str, Vec<JoinHandle<()>>>,
    shutdown: Arc<Notify>,
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceManager {
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            handles: HashMap::new(),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Register a service
    pub fn register(&mut self, service: Box<dyn Service>) {
        self.services.push(service);
    }

    pub fn shutdown_signal(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Start all services in priority order
    pub async fn start_all(&mut self) -> Result<(), String> {
        logger::info(LogTag::System, "Starting all services...");
        self.services.sort_by_key(|s| s.priority());

        let shutdown = self.shutdown.clone();
        for service in self.services.iter_mut() {
            let name = service.name();
            logger::info(LogTag::System, &format!("Initializing service: {}", name));
            service.initialize().await?;

            logger::info(LogTag::System, &format!("Starting service: {}", name));
            let handles = service.start(shutdown.clone()).await?;
            self.handles.insert(name, handles);

            logger::info(LogTag::System, &format!("Service started: {}", name));
        }

        logger::info(LogTag::System, "All services started");
        Ok(())
    }

    /// Stop all services in reverse startup order
    pub async fn stop_all(&mut self) {
        logger::info(LogTag::System, "Stopping all services...");

        // Signal shutdown to every running task first.
        self.shutdown.notify_waiters();

        for service in self.services.iter_mut().rev() {
            let name = service.name();
            logger::info(LogTag::System, &format!("Stopping service: {}", name));

            if let Err(e) = service.stop().await {
                logger::warning(
                    LogTag::System,
                    &format!("Service stop error for {}: {}", name, e),
                );
            }

            if let Some(handles) = self.handles.remove(name) {
                for handle in handles {
                    let _ = tokio::time::timeout(
                        tokio::time::Duration::from_secs(5),
                        handle,
                    )
                    .await;
                }
            }

            logger::info(LogTag::System, &format!("Service stopped: {}", name));
        }

        logger::info(LogTag::System, "All services stopped");
    }

    /// Health snapshot across registered services
    pub async fn get_health(&self) -> HashMap<&'static str, ServiceHealth> {
        let mut health = HashMap::new();
        for service in &self.services {
            health.insert(service.name(), service.health().await);
        }
        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static SEQUENCE: AtomicUsize = AtomicUsize::new(0);

    struct Recorder {
        name: &'static str,
        priority: i32,
        started_at: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Service for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn start(&mut self, _shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
            self.started_at
                .store(SEQUENCE.fetch_add(1, Ordering::SeqCst) + 1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn services_start_in_priority_order() {
        let late = Arc::new(AtomicUsize::new(0));
        let early = Arc::new(AtomicUsize::new(0));

        let mut manager = ServiceManager::new();
        manager.register(Box::new(Recorder {
            name: "late",
            priority: 50,
            started_at: late.clone(),
        }));
        manager.register(Box::new(Recorder {
            name: "early",
            priority: 10,
            started_at: early.clone(),
        }));

        manager.start_all().await.unwrap();
        assert!(early.load(Ordering::SeqCst) < late.load(Ordering::SeqCst));

        manager.stop_all().await;
        assert!(manager.get_health().await.values().all(|h| h.is_healthy()));
    }
}
