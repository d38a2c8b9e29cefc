use std::{collections::HashMap, time::Duration};
use tracing::{debug, error, info, warn};

use common::actors::{Actor, ActorType, ControlMessage, stop_requested};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Instant},
};
use uuid::Uuid;

pub type ActorFactory = Box<dyn Fn() -> Box<dyn Actor> + Send + Sync>;

const CHECK_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

pub struct Supervisor {
    actor_factories: HashMap<ActorType, ActorFactory>,
    pulses: HashMap<ActorType, Instant>,
    handles: HashMap<ActorType, JoinHandle<()>>,
    owners: HashMap<Uuid, ActorType>,
    errors: HashMap<ActorType, u32>,
    timeout: Duration,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            actor_factories: HashMap::new(),
            pulses: HashMap::new(),
            handles: HashMap::new(),
            owners: HashMap::new(),
            errors: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// How long an actor may stay silent before it is restarted.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn register_actor(&mut self, actor_type: ActorType, factory: ActorFactory) {
        self.actor_factories.insert(actor_type, factory);
    }

    /// Error reports received from any incarnation of `actor_type`.
    pub fn reported_errors(&self, actor_type: ActorType) -> u32 {
        self.errors.get(&actor_type).copied().unwrap_or(0)
    }

    /// Spawns every registered actor and watches their heartbeats until
    /// `shutdown` fires, then waits for the actors to wind down.
    pub async fn start(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut check_interval = time::interval(CHECK_INTERVAL);

        let (supervisor_tx, mut supervisor_rx) = mpsc::channel::<ControlMessage>(512);

        let actors: Vec<ActorType> = self.actor_factories.keys().copied().collect();
        for actor in actors {
            self.spawn_actor(actor, supervisor_tx.clone(), shutdown.clone());
        }

        loop {
            tokio::select! {
                _ = stop_requested(&mut shutdown) => {
                    info!("Shutdown requested, stopping {} actors", self.handles.len());
                    break;
                }

                Some(msg) = supervisor_rx.recv() => {
                    match msg {
                        ControlMessage::Heartbeat(id) => {
                            if let Some(&actor_type) = self.owners.get(&id) {
                                self.pulses.insert(actor_type, Instant::now());
                            }
                        }
                        ControlMessage::Shutdown(id) => {
                            if let Some(actor_type) = self.owners.remove(&id) {
                                warn!("{:?} is shutting down gracefully.", actor_type);
                                self.pulses.remove(&actor_type);
                                self.handles.remove(&actor_type);
                            }
                        }
                        ControlMessage::Error(id, error_msg) => match self.owners.get(&id) {
                            Some(&actor_type) => {
                                error!("{:?} reported error: {}", actor_type, error_msg);
                                *self.errors.entry(actor_type).or_default() += 1;
                            }
                            None => debug!("Dropping error from retired actor {}: {}", id, error_msg),
                        },
                    }
                }

                _ = check_interval.tick() => {
                    let Some(dead_line) = Instant::now().checked_sub(self.timeout) else {
                        continue;
                    };

                    let dead_actors: Vec<ActorType> = self
                        .pulses
                        .iter()
                        .filter(|&(_, &last)| last < dead_line)
                        .map(|(&actor_type, _)| actor_type)
                        .collect();

                    for actor_type in dead_actors {
                        warn!("{:?} is unresponsive! Restarting.", actor_type);
                        if let Some(handle) = self.handles.remove(&actor_type) {
                            handle.abort();
                        }
                        self.spawn_actor(actor_type, supervisor_tx.clone(), shutdown.clone());
                    }
                }
            }
        }

        for (actor_type, handle) in self.handles.drain() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("Actor {:?} panicked during shutdown: {}", actor_type, e);
                }
            }
        }
        self.pulses.clear();
        self.owners.clear();
        debug!("Supervisor stopped");
    }

    fn spawn_actor(
        &mut self,
        actor_type: ActorType,
        tx: mpsc::Sender<ControlMessage>,
        shutdown: watch::Receiver<bool>,
    ) {
        let Some(factory) = self.actor_factories.get(&actor_type) else {
            error!("No factory registered for {:?}", actor_type);
            return;
        };

        let mut new_actor = factory();
        if new_actor.name() != actor_type {
            error!(
                "Factory for {:?} built a {:?}, not spawning it",
                actor_type,
                new_actor.name()
            );
            return;
        }
        self.owners.retain(|_, owner| *owner != actor_type);
        self.owners.insert(new_actor.id(), actor_type);
        info!("Spawning {:?} as {}", new_actor.name(), new_actor.id());

        let new_actor_handle = tokio::spawn(async move {
            if let Err(e) = new_actor.run(tx, shutdown).await {
                error!("Actor {:?} crashed: {}", actor_type, e);
            }
        });
        self.handles.insert(actor_type, new_actor_handle);
        self.pulses.insert(actor_type, Instant::now());
    }
}
