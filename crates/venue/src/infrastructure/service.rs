//! Async front for a shared [`Venue`].
//!
//! A single tokio task owns the venue handle and drains a bounded command
//! channel. Callers talk to it through a cloneable [`VenueHandle`]; every
//! command carries a oneshot for its reply. Commands are executed in arrival
//! order, so submissions sent through one handle settle in the order sent.

use log::{debug, info};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::application::Venue;
use crate::error::{Result, VenueError};
use crate::model::{
    Instrument, InstrumentCode, Order, OrderId, ParticipantAccount, ParticipantId, SubmitOutcome,
};

/// Commands accepted by the venue task
#[derive(Debug)]
pub enum VenueCommand {
    SubmitOrder {
        instrument_code: InstrumentCode,
        order: Order,
        response: oneshot::Sender<Result<SubmitOutcome>>,
    },

    WithdrawOrder {
        instrument_code: InstrumentCode,
        order_id: OrderId,
        response: oneshot::Sender<Result<Order>>,
    },

    RegisterInstrument {
        instrument: Instrument,
        response: oneshot::Sender<Result<()>>,
    },

    RegisterParticipant {
        account: ParticipantAccount,
        response: oneshot::Sender<Result<ParticipantId>>,
    },

    GetAccount {
        participant_id: ParticipantId,
        response: oneshot::Sender<Result<ParticipantAccount>>,
    },

    /// Stop the task once every earlier command is answered
    Shutdown { response: oneshot::Sender<()> },
}

pub struct VenueService {
    venue: Arc<Venue>,
    rx: mpsc::Receiver<VenueCommand>,
}

impl VenueService {
    /// Start the venue task and return a handle to it
    pub fn spawn(venue: Arc<Venue>, capacity: usize) -> VenueHandle {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let service = Self { venue, rx };
        let task = tokio::spawn(service.run());

        VenueHandle {
            tx,
            task: Arc::new(parking_lot::Mutex::new(Some(task))),
        }
    }

    async fn run(mut self) {
        info!("Venue service started for {}", self.venue.name());

        while let Some(command) = self.rx.recv().await {
            match command {
                VenueCommand::SubmitOrder {
                    instrument_code,
                    order,
                    response,
                } => {
                    let _ = response.send(self.venue.submit_order(&instrument_code, order));
                }
                VenueCommand::WithdrawOrder {
                    instrument_code,
                    order_id,
                    response,
                } => {
                    let _ = response.send(self.venue.withdraw_order(&instrument_code, &order_id));
                }
                VenueCommand::RegisterInstrument {
                    instrument,
                    response,
                } => {
                    let _ = response.send(self.venue.register_instrument(instrument));
                }
                VenueCommand::RegisterParticipant { account, response } => {
                    let _ = response.send(self.venue.register_participant(account));
                }
                VenueCommand::GetAccount {
                    participant_id,
                    response,
                } => {
                    let _ = response.send(self.venue.account(&participant_id));
                }
                VenueCommand::Shutdown { response } => {
                    debug!("Venue service received shutdown");
                    let _ = response.send(());
                    break;
                }
            }
        }

        info!("Venue service stopped for {}", self.venue.name());
    }
}

/// Cloneable client for a running [`VenueService`]
#[derive(Clone)]
pub struct VenueHandle {
    tx: mpsc::Sender<VenueCommand>,
    task: Arc<parking_lot::Mutex<Option<JoinHandle<()>>>>,
}

impl std::fmt::Debug for VenueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl VenueHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> VenueCommand,
    ) -> std::result::Result<T, VenueError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(command(tx))
            .await
            .map_err(|_| VenueError::ServiceUnavailable)?;
        rx.await.map_err(|_| VenueError::ServiceUnavailable)
    }

    pub async fn submit_order(
        &self,
        instrument_code: InstrumentCode,
        order: Order,
    ) -> Result<SubmitOutcome> {
        self.request(|response| VenueCommand::SubmitOrder {
            instrument_code,
            order,
            response,
        })
        .await?
    }

    pub async fn withdraw_order(
        &self,
        instrument_code: InstrumentCode,
        order_id: OrderId,
    ) -> Result<Order> {
        self.request(|response| VenueCommand::WithdrawOrder {
            instrument_code,
            order_id,
            response,
        })
        .await?
    }

    pub async fn register_instrument(&self, instrument: Instrument) -> Result<()> {
        self.request(|response| VenueCommand::RegisterInstrument {
            instrument,
            response,
        })
        .await?
    }

    pub async fn register_participant(&self, account: ParticipantAccount) -> Result<ParticipantId> {
        self.request(|response| VenueCommand::RegisterParticipant { account, response })
            .await?
    }

    pub async fn account(&self, participant_id: ParticipantId) -> Result<ParticipantAccount> {
        self.request(|response| VenueCommand::GetAccount {
            participant_id,
            response,
        })
        .await?
    }

    /// Stop the service and wait for its task to finish.
    ///
    /// Later calls on any clone of this handle fail with `ServiceUnavailable`.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|response| VenueCommand::Shutdown { response })
            .await?;

        let task = self.task.lock().take();
        if let Some(task) = task {
            task.await
                .map_err(|_| VenueError::ServiceUnavailable)?;
        }
        Ok(())
    }
}
