//! Watch-face engine.
//!
//! The engine is a single owner driven by messages: platform callbacks,
//! timer ticks and time-zone broadcasts arrive as [`EngineEvent`]s on its
//! inbox, data changes arrive from the sync listener and connection changes
//! from the [`ConnectionManager`] watch channel. [`WatchFaceEngine::run`]
//! multiplexes the three with `tokio::select!`.

use std::sync::Arc;

use chrono_tz::Tz;
use sunshine_core::{HourFormat, WatchFaceConfig};
use sunshine_sync::{
    decode_weather, ConnectionManager, ConnectionState, DataEvent, DataEventBuffer,
    DataEventKind, ListenerId, SyncTransport, WEATHER_PATH,
};
use tokio::sync::{mpsc, watch};

use crate::clock::Clock;
use crate::hooks::SystemHooks;
use crate::render::{
    compose_frame, DeviceProperties, DisplayMode, PaintSet, RenderState, ScreenShape,
};
use crate::surface::DisplaySurface;
use crate::timer::UpdateTimer;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    VisibilityChanged(bool),
    AmbientModeChanged(bool),
    PropertiesChanged(DeviceProperties),
    ApplyWindowInsets(ScreenShape),
    /// Once-a-minute tick delivered by the system in ambient mode
    TimeTick,
    TimeZoneChanged(Tz),
    /// Interactive redraw tick, stamped with the timer generation
    UpdateTime(u64),
    Destroy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Created,
    VisibleInteractive,
    VisibleAmbient,
    Hidden,
}

/// Cloneable sender for the engine inbox
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineHandle {
    pub fn new(tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }

    /// Returns `false` once the engine has stopped.
    pub fn send(&self, event: EngineEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

struct Receivers {
    inbox: mpsc::UnboundedReceiver<EngineEvent>,
    data: mpsc::UnboundedReceiver<DataEventBuffer>,
    connection: watch::Receiver<ConnectionState>,
}

enum Next {
    Event(Option<EngineEvent>),
    Data(DataEventBuffer),
    Connection(Option<ConnectionState>),
}

pub struct WatchFaceEngine {
    config: WatchFaceConfig,
    connection: ConnectionManager,
    surface: Box<dyn DisplaySurface>,
    hooks: Box<dyn SystemHooks>,
    clock: Arc<dyn Clock>,
    handle: EngineHandle,
    data_tx: mpsc::UnboundedSender<DataEventBuffer>,
    receivers: Receivers,
    listener: Option<ListenerId>,
    timer: UpdateTimer,
    state: DisplayState,
    render: RenderState,
    paints: PaintSet,
    properties: DeviceProperties,
    shape: ScreenShape,
    time_zone_registered: bool,
    redraws: u64,
    destroyed: bool,
}

impl WatchFaceEngine {
    /// Create an engine in the `Created` state. Must be called inside a
    /// tokio runtime.
    pub fn new(
        config: WatchFaceConfig,
        transport: Arc<dyn SyncTransport>,
        surface: Box<dyn DisplaySurface>,
        hooks: Box<dyn SystemHooks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        let (data_tx, data) = mpsc::unbounded_channel();
        let connection = ConnectionManager::new(transport);
        let handle = EngineHandle::new(inbox_tx);

        let timer = UpdateTimer::new(
            handle.clone(),
            Arc::clone(&clock),
            config.interactive_update_ms.max(1),
        );
        let render = RenderState::new(hooks.default_time_zone(), clock.now_millis());
        let shape = ScreenShape::default();
        let paints = PaintSet::new(shape, &config.layout);

        Self {
            receivers: Receivers {
                inbox,
                data,
                connection: connection.subscribe(),
            },
            config,
            connection,
            surface,
            hooks,
            clock,
            handle,
            data_tx,
            listener: None,
            timer,
            state: DisplayState::Created,
            render,
            paints,
            properties: DeviceProperties::default(),
            shape,
            time_zone_registered: false,
            redraws: 0,
            destroyed: false,
        }
    }

    /// Sender for platform callbacks
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render
    }

    pub fn paints(&self) -> &PaintSet {
        &self.paints
    }

    pub fn properties(&self) -> DeviceProperties {
        self.properties
    }

    pub fn shape(&self) -> ScreenShape {
        self.shape
    }

    pub fn listener_attached(&self) -> bool {
        self.listener.is_some()
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Number of frames presented so far
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    pub fn is_visible(&self) -> bool {
        matches!(
            self.state,
            DisplayState::VisibleInteractive | DisplayState::VisibleAmbient
        )
    }

    pub fn is_ambient(&self) -> bool {
        self.render.mode == DisplayMode::Ambient
    }

    fn should_timer_run(&self) -> bool {
        self.is_visible() && !self.is_ambient()
    }

    fn visible_state(&self) -> DisplayState {
        if self.is_ambient() {
            DisplayState::VisibleAmbient
        } else {
            DisplayState::VisibleInteractive
        }
    }

    /// Process messages until `Destroy` arrives.
    pub async fn run(mut self) {
        while self.step().await {}
        tracing::debug!("Watch face engine stopped");
    }

    /// Wait for and handle one message. Returns `false` once destroyed.
    pub async fn step(&mut self) -> bool {
        if self.destroyed {
            return false;
        }

        let next = {
            let rx = &mut self.receivers;
            tokio::select! {
                event = rx.inbox.recv() => Next::Event(event),
                Some(events) = rx.data.recv() => Next::Data(events),
                changed = rx.connection.changed() => Next::Connection(
                    changed.ok().map(|_| rx.connection.borrow_and_update().clone())
                ),
            }
        };

        match next {
            Next::Event(Some(event)) => self.handle_event(event).await,
            Next::Event(None) => false,
            Next::Data(events) => {
                self.on_data_changed(&events);
                true
            }
            Next::Connection(Some(state)) => {
                self.on_connection_state(state).await;
                true
            }
            Next::Connection(None) => {
                tracing::warn!("Connection state channel closed");
                false
            }
        }
    }

    /// Dispatch one inbox event. Returns `false` for `Destroy`.
    pub async fn handle_event(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::VisibilityChanged(visible) => self.on_visibility_changed(visible).await,
            EngineEvent::AmbientModeChanged(ambient) => self.on_ambient_mode_changed(ambient),
            EngineEvent::PropertiesChanged(properties) => self.on_properties_changed(properties),
            EngineEvent::ApplyWindowInsets(shape) => self.on_apply_window_insets(shape),
            EngineEvent::TimeTick => self.on_time_tick(),
            EngineEvent::TimeZoneChanged(tz) => self.on_time_zone_changed(tz),
            EngineEvent::UpdateTime(generation) => self.handle_update_time(generation),
            EngineEvent::Destroy => {
                self.on_destroy().await;
                return false;
            }
        }
        true
    }

    pub async fn on_visibility_changed(&mut self, visible: bool) {
        if visible {
            self.state = self.visible_state();
            self.connection.connect_if_absent();

            if !self.time_zone_registered {
                self.hooks.register_time_zone_listener(self.handle.clone());
                self.time_zone_registered = true;
            }
            // The zone may have changed while no listener was registered
            self.render.set_time_zone(self.hooks.default_time_zone());
            self.invalidate();
        } else {
            self.state = DisplayState::Hidden;
            self.unregister_time_zone_listener();
            self.detach_listener().await;
            self.connection.release().await;
        }
        tracing::debug!(state = ?self.state, "Visibility changed");
        self.update_timer();
    }

    pub fn on_ambient_mode_changed(&mut self, ambient: bool) {
        self.render.mode = if ambient {
            DisplayMode::Ambient
        } else {
            DisplayMode::Interactive
        };
        if self.is_visible() {
            self.state = self.visible_state();
        }
        tracing::debug!(
            ambient,
            low_bit = self.properties.low_bit_ambient,
            burn_in = self.properties.burn_in_protection,
            "Ambient mode changed"
        );
        self.invalidate();
        self.update_timer();
    }

    pub fn on_properties_changed(&mut self, properties: DeviceProperties) {
        tracing::debug!(?properties, "Device properties");
        self.properties = properties;
    }

    pub fn on_apply_window_insets(&mut self, shape: ScreenShape) {
        self.shape = shape;
        self.paints.apply_text_sizes(shape, &self.config.layout);
    }

    pub fn on_time_tick(&mut self) {
        self.invalidate();
    }

    pub fn on_time_zone_changed(&mut self, time_zone: Tz) {
        tracing::debug!(%time_zone, "Time zone changed");
        self.render.set_time_zone(time_zone);
        self.invalidate();
    }

    /// Interactive tick. Ticks from a stopped or restarted timer are dropped.
    pub fn handle_update_time(&mut self, generation: u64) {
        if generation != self.timer.generation() || !self.timer.is_running() {
            tracing::trace!(generation, current = self.timer.generation(), "Stale tick");
            return;
        }
        if !self.should_timer_run() {
            return;
        }
        self.invalidate();
    }

    pub async fn on_connection_state(&mut self, state: ConnectionState) {
        match state {
            ConnectionState::Connected => {
                if self.is_visible() && self.listener.is_none() {
                    self.attach_listener().await;
                }
            }
            ConnectionState::Failed(e) => tracing::debug!("Sync channel unavailable: {}", e),
            ConnectionState::Disconnected => {
                // Listeners do not survive the connection
                if let Some(id) = self.listener.take() {
                    tracing::debug!(%id, "Listener dropped with connection");
                }
            }
            ConnectionState::Connecting => {}
        }
    }

    /// Apply a batch of data changes. Only `Changed` events for the weather
    /// path are used; records that fail to decode are skipped.
    pub fn on_data_changed(&mut self, events: &[DataEvent]) {
        for event in events {
            if event.kind != DataEventKind::Changed || event.item.path != WEATHER_PATH {
                tracing::trace!(path = %event.item.path, kind = ?event.kind, "Ignoring data event");
                continue;
            }
            match decode_weather(&event.item) {
                Ok(summary) => {
                    tracing::debug!(
                        high = %summary.high,
                        low = %summary.low,
                        weather_id = summary.condition_code,
                        "Weather received"
                    );
                    self.render.set_weather(summary);
                    self.invalidate();
                }
                Err(e) => tracing::warn!("Skipping weather record: {}", e),
            }
        }
    }

    pub async fn on_destroy(&mut self) {
        self.timer.stop();
        self.unregister_time_zone_listener();
        self.detach_listener().await;
        self.connection.release().await;
        self.destroyed = true;
        tracing::debug!("Watch face destroyed");
    }

    /// Redraw now if the face is on screen
    pub fn invalidate(&mut self) {
        if !self.is_visible() {
            tracing::trace!("Not visible, skipping redraw");
            return;
        }
        self.draw();
    }

    fn draw(&mut self) {
        self.render.update_time(self.clock.now_millis());

        let use_24_hour = match self.config.hour_format {
            HourFormat::System => self.hooks.is_24_hour_format(),
            HourFormat::TwelveHour => false,
            HourFormat::TwentyFourHour => true,
        };
        let paints = self
            .paints
            .for_mode(self.render.mode, &self.properties);
        let frame = compose_frame(
            &self.render,
            &paints,
            self.paints.background,
            &self.config.layout,
            use_24_hour,
            self.surface.as_ref(),
        );

        self.surface.present(frame);
        self.redraws += 1;
    }

    /// Start the interactive timer if it should run, otherwise stop it
    fn update_timer(&mut self) {
        if self.should_timer_run() {
            self.timer.restart();
        } else {
            self.timer.stop();
        }
    }

    fn unregister_time_zone_listener(&mut self) {
        if self.time_zone_registered {
            self.hooks.unregister_time_zone_listener();
            self.time_zone_registered = false;
        }
    }

    async fn attach_listener(&mut self) {
        match self
            .connection
            .transport()
            .add_listener(self.data_tx.clone())
            .await
        {
            Ok(id) => {
                tracing::debug!(%id, "Data listener attached");
                self.listener = Some(id);
            }
            Err(e) => tracing::warn!("Failed to attach data listener: {}", e),
        }
    }

    async fn detach_listener(&mut self) {
        let Some(id) = self.listener.take() else {
            return;
        };
        match self.connection.transport().remove_listener(id).await {
            Ok(()) => tracing::debug!(%id, "Data listener detached"),
            Err(e) => tracing::warn!("Failed to detach data listener: {}", e),
        }
    }
}
