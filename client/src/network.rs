use crate::game::ClientGameState;
use crate::input::IntentState;
use log::{debug, info, warn};
use shared::{Command, Dispatch, IntentFlags, Transport, WriteQueue};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

/// Client-side command dispatch and local session state
pub struct ClientSession {
    server_addr: SocketAddr,
    game_state: ClientGameState,
    intent: IntentState,
    queue: WriteQueue,
    should_exit: bool,
}

impl ClientSession {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self {
            server_addr,
            game_state: ClientGameState::new(),
            intent: IntentState::new(),
            queue: WriteQueue::new(),
            should_exit: false,
        }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    pub fn intent(&self) -> &IntentState {
        &self.intent
    }

    pub fn intent_mut(&mut self) -> &mut IntentState {
        &mut self.intent
    }

    pub fn queue(&self) -> &WriteQueue {
        &self.queue
    }

    /// True once the server has sent `Quit`
    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn send_hello(&mut self) {
        self.queue.push(&Command::Hello, self.server_addr);
    }

    pub fn send_quit(&mut self) {
        self.queue.push(&Command::Quit, self.server_addr);
    }

    /// Queues the current intent unconditionally
    pub fn send_client(&mut self) {
        let intent = self.intent.flags();
        self.queue_intent(intent);
    }

    /// Advances local interpolation and queues the intent if it changed
    pub fn step(&mut self, dt: f32) {
        if let Some(intent) = self.intent.take_changed() {
            self.queue_intent(intent);
        }
        self.game_state.interpolate(dt);
    }

    fn queue_intent(&mut self, intent: IntentFlags) {
        self.queue
            .push(&Command::Client { intent }, self.server_addr);
    }
}

impl Dispatch for ClientSession {
    fn handle(&mut self, command: Command, from: SocketAddr) {
        match command {
            Command::Quit => {
                info!("Server {} closed the session", from);
                self.should_exit = true;
            }
            Command::Spawn { kind, id, color } => self.game_state.spawn(kind, id, color),
            Command::Destroy { id } => {
                self.game_state.destroy(id);
            }
            Command::Update { entities } => {
                let applied = self.game_state.apply_update(&entities);
                if applied < entities.len() {
                    debug!("Applied {} of {} snapshot records", applied, entities.len());
                }
            }
            other => warn!("Unexpected {:?} from {}", other.code(), from),
        }
    }

    fn write_queue(&mut self) -> &mut WriteQueue {
        &mut self.queue
    }
}

/// Client endpoint bound to an ephemeral port
pub struct Client {
    transport: Transport,
    session: ClientSession,
}

impl Client {
    /// Binds an ephemeral socket targeting `server_addr`
    pub fn connect<A: ToSocketAddrs>(server_addr: A) -> io::Result<Self> {
        let server_addr = server_addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "Server address did not resolve")
        })?;

        let bind_addr: SocketAddr = if server_addr.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let transport = Transport::bind(bind_addr)?;
        info!(
            "Client bound to {}, server at {}",
            transport.local_addr()?,
            server_addr
        );

        Ok(Client {
            transport,
            session: ClientSession::new(server_addr),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ClientSession {
        &mut self.session
    }

    pub fn game_state(&self) -> &ClientGameState {
        self.session.game_state()
    }

    pub fn should_exit(&self) -> bool {
        self.session.should_exit()
    }

    pub fn send_hello(&mut self) {
        self.session.send_hello();
    }

    pub fn send_quit(&mut self) {
        self.session.send_quit();
    }

    /// Resends the current intent in case an earlier one was lost
    pub fn send_client(&mut self) {
        self.session.send_client();
    }

    pub fn start_move(&mut self, flags: IntentFlags) {
        self.session.intent_mut().start_move(flags);
    }

    pub fn stop_move(&mut self, flags: IntentFlags) {
        self.session.intent_mut().stop_move(flags);
    }

    /// Runs one client frame: receive, step local state, flush
    pub fn update(&mut self, dt: f32) -> io::Result<()> {
        self.transport.receive(&mut self.session)?;
        self.session.step(dt);
        self.transport.flush(self.session.write_queue())?;
        Ok(())
    }

    /// Sends whatever is queued without receiving
    pub fn flush(&mut self) -> io::Result<usize> {
        self.transport.flush(self.session.write_queue())
    }
}
