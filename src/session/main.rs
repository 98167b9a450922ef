use crate::acquisition::pipeline::AcquisitionPipeline;
use crate::device_camera::interface::DeviceCamera;
use crate::library::logger::interface::Logger;
use crate::session::core::{init, transition, Effect, Event, Model};
use crate::session::render::Render;
use crate::session::run_effect::RunEffect;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{watch, Notify};

/// Drives the session: one event at a time through `transition`, then render,
/// then spawn the effects. Only this loop writes the model.
pub struct Session {
    logger: Arc<dyn Logger + Send + Sync>,
    render: Render,
    run_effect: RunEffect,
    event_sender: UnboundedSender<Event>,
    event_receiver: UnboundedReceiver<Event>,
    model: watch::Sender<Model>,
    shutdown: Arc<Notify>,
}

/// What the outside world (UI, tests) gets to talk to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    event_sender: UnboundedSender<Event>,
    model: watch::Receiver<Model>,
    shutdown: Arc<Notify>,
}

impl SessionHandle {
    pub fn dispatch(&self, event: Event) -> bool {
        self.event_sender.send(event).is_ok()
    }

    pub fn model(&self) -> Model {
        self.model.borrow().clone()
    }

    /// Resolves with the first published model matching `predicate`, or
    /// `None` once the session is gone.
    pub async fn wait_for(&self, predicate: impl FnMut(&Model) -> bool) -> Option<Model> {
        let mut model = self.model.clone();
        let found = model.wait_for(predicate).await.ok().map(|m| m.clone());
        found
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

impl Session {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        render: Render,
        pipeline: Arc<AcquisitionPipeline>,
        device_camera: Arc<dyn DeviceCamera + Send + Sync>,
    ) -> Self {
        let logger = logger.with_namespace("session");
        let (event_sender, event_receiver) = unbounded_channel();
        let (model, _) = watch::channel(Model::default());
        let run_effect = RunEffect::new(
            logger.with_namespace("effect"),
            pipeline,
            device_camera,
            event_sender.clone(),
        );

        Self {
            logger,
            render,
            run_effect,
            event_sender,
            event_receiver,
            model,
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            event_sender: self.event_sender.clone(),
            model: self.model.subscribe(),
            shutdown: self.shutdown.clone(),
        }
    }

    fn spawn_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            let run_effect = self.run_effect.clone();
            let logger = self.logger.clone();
            tokio::spawn(async move {
                if let Err(e) = run_effect.run_effect(effect).await {
                    let _ = logger.error(&format!("Effect failed: {}", e));
                }
            });
        }
    }

    fn publish(&self, model: &Model) {
        if let Err(e) = self.render.render(model) {
            let _ = self.logger.error(&format!("Render failed: {}", e));
        }
        self.model.send_replace(model.clone());
    }

    pub async fn run(mut self) {
        let (mut current_model, effects) = init();
        self.publish(&current_model);
        self.spawn_effects(effects);

        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.notified() => break,
                event = self.event_receiver.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let old_state = current_model.state.name();
            let event_display = event.to_display_string();
            let (new_model, effects) = transition(current_model.clone(), event);

            if new_model == current_model && effects.is_empty() {
                let _ = self.logger.info(&format!(
                    "Ignored event in {}: {}",
                    old_state, event_display
                ));
                continue;
            }

            let _ = self.logger.info(&format!(
                "{} --{}--> {} (token {}, camera {}), effects: {:?}",
                old_state,
                event_display,
                new_model.state.name(),
                new_model.last_token,
                new_model.last_camera,
                effects
            ));

            current_model = new_model;
            self.publish(&current_model);
            self.spawn_effects(effects);
        }

        let _ = self.logger.info("Session stopped");
    }
}
