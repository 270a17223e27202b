//! Per-connection handler: route parsing, scope loops, and teardown.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The upgrade path decides the scope:
//!
//! - `/lobby/create/{owner}` — one-shot create call
//! - `/lobby/list`           — one-shot discovery call
//! - `/lobby/{code}`         — lobby session (waiting room)
//! - `/game/{code}`          — game session (the match itself)
//!
//! Session scopes run a select loop over two sources: frames from the
//! socket, and the outbound queue the engine broadcasts into. The engine
//! never touches the socket — this handler is the only writer.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use trigrid_engine::Outbound;
use trigrid_protocol::{
    Codec, GameCode, GameEvent, GameStatus, LobbyCode, LobbyEvent,
};
use trigrid_session::Authenticator;
use trigrid_transport::{Connection, WebSocketConnection};

use crate::TrigridError;
use crate::server::ServerState;

/// Where a connection's upgrade path points it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    CreateLobby { owner: String },
    ListLobbies,
    Lobby(LobbyCode),
    Game(GameCode),
    Unknown,
}

fn parse_route(path: &str) -> Route {
    let mut parts = path.trim_matches('/').split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("lobby"), Some("create"), Some(owner), None) if !owner.is_empty() => {
            Route::CreateLobby {
                owner: owner.to_string(),
            }
        }
        // `create` and `list` are reserved; a create call without an
        // owner segment is not a lobby named "create".
        (Some("lobby"), Some("create"), _, _) => Route::Unknown,
        (Some("lobby"), Some("list"), None, None) => Route::ListLobbies,
        (Some("lobby"), Some(code), None, None) if !code.is_empty() => {
            Route::Lobby(LobbyCode(code.to_string()))
        }
        (Some("game"), Some(code), None, None) if !code.is_empty() => {
            Route::Game(GameCode(code.to_string()))
        }
        _ => Route::Unknown,
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, C>>,
) -> Result<(), TrigridError>
where
    A: Authenticator,
    C: Codec,
{
    let route = parse_route(conn.path());
    tracing::debug!(conn_id = %conn.id(), path = conn.path(), ?route, "connection routed");

    match route {
        Route::CreateLobby { owner } => create_lobby(&conn, &state, &owner).await,
        Route::ListLobbies => list_lobbies(&conn, &state).await,
        Route::Lobby(code) => lobby_session(&conn, &state, code).await,
        Route::Game(code) => game_session(&conn, &state, code).await,
        Route::Unknown => {
            let _ = conn.close().await;
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// One-shot calls
// ---------------------------------------------------------------------------

/// Create call: mint a lobby for `owner`, answer with its code, close.
async fn create_lobby<A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<A, C>>,
    owner: &str,
) -> Result<(), TrigridError>
where
    A: Authenticator,
    C: Codec,
{
    let code = state.registry.lock().await.create_lobby(owner);
    send_event(conn, &state.codec, &LobbyEvent::CreateLobby { code }).await?;
    let _ = conn.close().await;
    Ok(())
}

/// Discovery call: answer with a snapshot of every live lobby, close.
async fn list_lobbies<A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<A, C>>,
) -> Result<(), TrigridError>
where
    A: Authenticator,
    C: Codec,
{
    let lobbies = {
        let registry = state.registry.lock().await;
        registry.list_lobbies().await
    };
    send_event(conn, &state.codec, &LobbyEvent::LobbyList { lobbies }).await?;
    let _ = conn.close().await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Lobby scope
// ---------------------------------------------------------------------------

async fn lobby_session<A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<A, C>>,
    code: LobbyCode,
) -> Result<(), TrigridError>
where
    A: Authenticator,
    C: Codec,
{
    // The first message is the joiner's identity claim.
    let Some(data) = conn.recv().await.map_err(TrigridError::Transport)? else {
        return Ok(()); // closed before joining
    };
    let claim = match state.codec.decode::<LobbyEvent>(&data) {
        Ok(LobbyEvent::JoinLobby(user)) => user,
        Ok(_) | Err(_) => {
            send_event(conn, &state.codec, &LobbyEvent::invalid_event()).await?;
            let _ = conn.close().await;
            return Ok(());
        }
    };

    let user = match state.auth.authenticate(&claim).await {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!(conn_id = %conn.id(), error = %e, "identity claim rejected");
            send_event(conn, &state.codec, &LobbyEvent::invalid_event()).await?;
            let _ = conn.close().await;
            return Ok(());
        }
    };

    // Unknown lobby codes close without a response.
    let Some(lobby) = state.registry.lock().await.lobby(&code) else {
        let _ = conn.close().await;
        return Ok(());
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    if !lobby.lock().await.join(user.clone(), tx) {
        send_event(conn, &state.codec, &LobbyEvent::lobby_full()).await?;
        let _ = conn.close().await;
        return Ok(());
    }

    tracing::info!(conn_id = %conn.id(), %code, user = %user, "lobby session open");

    // Whether teardown still speaks for the member. A dead outbound
    // queue means the member re-joined on a newer connection and this
    // one no longer represents them.
    let mut member = true;

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(Outbound::Event(event)) => {
                    // A failed write means the socket is gone; fall
                    // through to the leave path.
                    if send_event(conn, &state.codec, &event).await.is_err() {
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    member = false;
                    break;
                }
            },
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    // Clean close and transport failure both mean the
                    // member is gone.
                    Ok(None) | Err(_) => break,
                };
                let event = match state.codec.decode::<LobbyEvent>(&data) {
                    Ok(event) => event,
                    Err(_) => {
                        // The lobby scope survives protocol errors.
                        if send_event(conn, &state.codec, &LobbyEvent::invalid_event())
                            .await
                            .is_err()
                        {
                            break;
                        }
                        continue;
                    }
                };
                if matches!(event, LobbyEvent::StartLobby { .. })
                    && start_lobby(conn, state, &code, &lobby, &user.id).await.is_err()
                {
                    break;
                }
                // Every other kind carries no meaning from a client in
                // this scope and is dropped.
            }
        }
    }

    // Teardown: drop the member; the last one out closes the lobby.
    if member {
        let remaining = lobby.lock().await.leave(&user.id);
        if remaining == 0 {
            state.registry.lock().await.close_lobby(&code);
        }
    }
    let _ = conn.close().await;
    Ok(())
}

/// Runs the owner's start request: mint the game, then notify the lobby.
///
/// A `START_LOBBY` from anyone but the owner is dropped without a
/// response on purpose.
async fn start_lobby<A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<A, C>>,
    code: &LobbyCode,
    lobby: &Arc<tokio::sync::Mutex<trigrid_engine::Lobby>>,
    sender_id: &str,
) -> Result<(), TrigridError>
where
    A: Authenticator,
    C: Codec,
{
    if lobby.lock().await.owner() != sender_id {
        tracing::debug!(%code, sender_id, "START_LOBBY from non-owner ignored");
        return Ok(());
    }

    let minted = state.registry.lock().await.start_lobby(code).await;
    match minted {
        Some(game_code) => {
            lobby.lock().await.start(&game_code);
        }
        None => {
            send_event(conn, &state.codec, &LobbyEvent::invalid_event()).await?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Game scope
// ---------------------------------------------------------------------------

async fn game_session<A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<A, C>>,
    code: GameCode,
) -> Result<(), TrigridError>
where
    A: Authenticator,
    C: Codec,
{
    let Some(game) = state.registry.lock().await.game(&code) else {
        send_event(conn, &state.codec, &GameEvent::unauthorized()).await?;
        let _ = conn.close().await;
        return Ok(());
    };

    // The first message names the seat this connection speaks for.
    let Some(data) = conn.recv().await.map_err(TrigridError::Transport)? else {
        return Ok(());
    };
    let user_id = match state.codec.decode::<GameEvent>(&data) {
        Ok(GameEvent::UserConnected { user_id }) => user_id,
        Ok(_) | Err(_) => {
            send_event(conn, &state.codec, &GameEvent::invalid_event()).await?;
            let _ = conn.close().await;
            return Ok(());
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    {
        let mut game = game.lock().await;
        if !game.connect_user(&user_id, tx) {
            drop(game);
            send_event(conn, &state.codec, &GameEvent::unauthorized()).await?;
            let _ = conn.close().await;
            return Ok(());
        }
        // Everyone sees the newly bound seat, then the referee starts
        // the match once the second seat is in.
        game.game_sync();
        if game.connected_count() == 2 {
            game.start_game();
        }
    }

    tracing::info!(conn_id = %conn.id(), %code, %user_id, "game session open");

    // Whether teardown still owes the registry a reclaim. A
    // server-initiated close means the game ended naturally and was
    // already reclaimed by whoever ended it.
    let mut reclaim = true;

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(Outbound::Event(event)) => {
                    // A failed write means the socket is gone; fall
                    // through to the disconnect path.
                    if send_event(conn, &state.codec, &event).await.is_err() {
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    reclaim = false;
                    break;
                }
            },
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) | Err(_) => break,
                };
                let event = match state.codec.decode::<GameEvent>(&data) {
                    Ok(event) => event,
                    Err(_) => {
                        // Protocol errors are fatal in the game scope.
                        let _ = send_event(conn, &state.codec, &GameEvent::invalid_event())
                            .await;
                        break;
                    }
                };

                let terminated = game.lock().await.apply_turn(&user_id, &event);
                if terminated {
                    // Natural termination: reclaim the code now, keep
                    // looping so the queued RESULT and Close flush to
                    // this socket too.
                    state.registry.lock().await.close_game(&code);
                }
            }
        }
    }

    if reclaim {
        let mut game_guard = game.lock().await;
        if game_guard.status() != GameStatus::Ended {
            game_guard.handle_disconnect(&user_id);
            drop(game_guard);
            state.registry.lock().await.close_game(&code);
        }
    }

    let _ = conn.close().await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

/// Encodes `event` and writes it to the connection.
async fn send_event<C: Codec, T: Serialize>(
    conn: &WebSocketConnection,
    codec: &C,
    event: &T,
) -> Result<(), TrigridError> {
    let bytes = codec.encode(event)?;
    conn.send(&bytes).await.map_err(TrigridError::Transport)
}

// =========================================================================
// Tests
// =========================================================================
