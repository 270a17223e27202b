//! Integration tests for the Trigrid server: real WebSocket clients
//! driving the full lobby → game lifecycle end-to-end.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_tungstenite::tungstenite::Message;
use trigrid::prelude::*;

// =========================================================================
// Helpers
// =========================================================================

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = TrigridServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(AcceptClaims)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str, path: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}{path}"))
        .await
        .expect("should connect");
    ws
}

async fn send<T: Serialize>(ws: &mut Ws, event: &T) {
    let text = serde_json::to_string(event).unwrap();
    ws.send(Message::text(text)).await.unwrap();
}

/// Receives and decodes the next data frame, skipping control frames.
async fn recv<T: DeserializeOwned>(ws: &mut Ws) -> T {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended unexpectedly")
            .expect("websocket error");
        match msg {
            Message::Text(_) | Message::Binary(_) => {
                return serde_json::from_slice(&msg.into_data()).unwrap();
            }
            _ => continue,
        }
    }
}

/// Asserts that the server closes the connection from its side.
async fn assert_server_closed(ws: &mut Ws) {
    loop {
        match tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for close")
        {
            None | Some(Ok(Message::Close(_))) | Some(Err(_)) => return,
            Some(Ok(_)) => continue,
        }
    }
}

fn join_event(n: u32) -> LobbyEvent {
    LobbyEvent::JoinLobby(LobbyUser::new(format!("u{n}"), format!("player-{n}")))
}

/// Creates a lobby owned by `owner` over the one-shot create call.
async fn create_lobby(addr: &str, owner: &str) -> LobbyCode {
    let mut ws = connect(addr, &format!("/lobby/create/{owner}")).await;
    let event: LobbyEvent = recv(&mut ws).await;
    let LobbyEvent::CreateLobby { code } = event else {
        panic!("expected CREATE_LOBBY, got {event:?}");
    };
    assert_server_closed(&mut ws).await;
    code
}

/// Joins `n` into the lobby and drains the resulting STATE_SYNC.
async fn join_lobby(addr: &str, code: &LobbyCode, n: u32) -> Ws {
    let mut ws = connect(addr, &format!("/lobby/{}", code.as_str())).await;
    send(&mut ws, &join_event(n)).await;
    let event: LobbyEvent = recv(&mut ws).await;
    assert!(matches!(event, LobbyEvent::StateSync { .. }));
    ws
}

/// Opens a game connection for `n` and announces the seat.
async fn connect_game(addr: &str, code: &GameCode, n: u32) -> Ws {
    let mut ws = connect(addr, &format!("/game/{}", code.as_str())).await;
    send(
        &mut ws,
        &GameEvent::UserConnected {
            user_id: format!("u{n}"),
        },
    )
    .await;
    ws
}

/// Runs two members through a lobby to a started game and returns both
/// game connections plus who moves first. Start broadcasts are drained.
async fn setup_started_game(addr: &str) -> (Ws, Ws, LobbyUser, LobbyUser) {
    let code = create_lobby(addr, "u1").await;
    let mut l1 = join_lobby(addr, &code, 1).await;
    let mut l2 = join_lobby(addr, &code, 2).await;
    let _: LobbyEvent = recv(&mut l1).await; // u2's STATE_SYNC

    send(&mut l1, &LobbyEvent::StartLobby { user_id: "u1".into() }).await;
    let event: LobbyEvent = recv(&mut l1).await;
    let LobbyEvent::LobbyStarting { code: game_code, starting: true } = event else {
        panic!("expected LOBBY_STARTING, got {event:?}");
    };
    let _: LobbyEvent = recv(&mut l2).await; // same notice

    let mut g1 = connect_game(addr, &game_code, 1).await;
    let _: GameEvent = recv(&mut g1).await; // GAME_SYNC (forming, one seat)
    let mut g2 = connect_game(addr, &game_code, 2).await;

    // Both seats bound: sync, then FIRST_TURN, then the started sync.
    let _: GameEvent = recv(&mut g1).await;
    let first: GameEvent = recv(&mut g1).await;
    let GameEvent::FirstTurn(first) = first else {
        panic!("expected FIRST_TURN, got {first:?}");
    };
    let _: GameEvent = recv(&mut g1).await;

    let _: GameEvent = recv(&mut g2).await;
    let _: GameEvent = recv(&mut g2).await; // FIRST_TURN
    let _: GameEvent = recv(&mut g2).await;

    let (second, g_first, g_second) = if first.id == "u1" {
        (LobbyUser::new("u2", "player-2"), g1, g2)
    } else {
        (LobbyUser::new("u1", "player-1"), g2, g1)
    };
    (g_first, g_second, first, second)
}

/// Sends one move and drains the broadcasts it produced on both sides
/// (two syncs for the mover; relay plus two syncs for the opponent).
async fn play(mover: &mut Ws, other: &mut Ws, tile_index: usize) {
    send(mover, &GameEvent::UserTurn { tile_index }).await;
    let _: GameEvent = recv(mover).await;
    let _: GameEvent = recv(mover).await;
    let relayed: GameEvent = recv(other).await;
    assert_eq!(relayed, GameEvent::UserTurn { tile_index });
    let _: GameEvent = recv(other).await;
    let _: GameEvent = recv(other).await;
}

// =========================================================================
// Discovery surface
// =========================================================================

#[tokio::test]
async fn test_create_lobby_returns_code_and_closes() {
    let addr = start_server().await;
    let code = create_lobby(&addr, "u1").await;
    assert_eq!(code.as_str().len(), 6);
}

#[tokio::test]
async fn test_list_lobbies_shows_live_lobbies() {
    let addr = start_server().await;
    let code = create_lobby(&addr, "u1").await;
    let _member = join_lobby(&addr, &code, 1).await;

    let mut ws = connect(&addr, "/lobby/list").await;
    let event: LobbyEvent = recv(&mut ws).await;
    let LobbyEvent::LobbyList { lobbies } = event else {
        panic!("expected LOBBY_LIST, got {event:?}");
    };

    let entry = lobbies.iter().find(|l| l.code == code).expect("listed");
    assert_eq!(entry.owner, "u1");
    assert_eq!(entry.players, vec![LobbyUser::new("u1", "player-1")]);
    assert_server_closed(&mut ws).await;
}

// =========================================================================
// Lobby scope
// =========================================================================

#[tokio::test]
async fn test_join_broadcasts_membership_to_everyone() {
    let addr = start_server().await;
    let code = create_lobby(&addr, "u1").await;

    let mut l1 = join_lobby(&addr, &code, 1).await;
    let mut l2 = connect(&addr, &format!("/lobby/{}", code.as_str())).await;
    send(&mut l2, &join_event(2)).await;

    let expected_users = vec![
        LobbyUser::new("u1", "player-1"),
        LobbyUser::new("u2", "player-2"),
    ];
    for ws in [&mut l1, &mut l2] {
        let event: LobbyEvent = recv(ws).await;
        let LobbyEvent::StateSync { owner, users, .. } = event else {
            panic!("expected STATE_SYNC, got {event:?}");
        };
        assert_eq!(owner, "u1");
        assert_eq!(users, expected_users);
    }
}

#[tokio::test]
async fn test_third_join_gets_lobby_full_and_close() {
    let addr = start_server().await;
    let code = create_lobby(&addr, "u1").await;
    let _l1 = join_lobby(&addr, &code, 1).await;
    let _l2 = join_lobby(&addr, &code, 2).await;

    let mut l3 = connect(&addr, &format!("/lobby/{}", code.as_str())).await;
    send(&mut l3, &join_event(3)).await;

    let event: LobbyEvent = recv(&mut l3).await;
    assert_eq!(event, LobbyEvent::lobby_full());
    assert_server_closed(&mut l3).await;
}

#[tokio::test]
async fn test_unknown_lobby_code_closes_silently() {
    let addr = start_server().await;
    let mut ws = connect(&addr, "/lobby/NOSUCH").await;
    send(&mut ws, &join_event(1)).await;
    assert_server_closed(&mut ws).await;
}

#[tokio::test]
async fn test_malformed_first_message_gets_invalid_event() {
    let addr = start_server().await;
    let code = create_lobby(&addr, "u1").await;

    let mut ws = connect(&addr, &format!("/lobby/{}", code.as_str())).await;
    ws.send(Message::text("{not json")).await.unwrap();

    let event: LobbyEvent = recv(&mut ws).await;
    assert_eq!(event, LobbyEvent::invalid_event());
    assert_server_closed(&mut ws).await;
}

#[tokio::test]
async fn test_malformed_event_mid_lobby_does_not_drop_connection() {
    let addr = start_server().await;
    let code = create_lobby(&addr, "u1").await;
    let mut l1 = join_lobby(&addr, &code, 1).await;

    ws_garbage(&mut l1).await;
    let event: LobbyEvent = recv(&mut l1).await;
    assert_eq!(event, LobbyEvent::invalid_event());

    // Still a member: a second join is observed on the same connection.
    let _l2 = join_lobby(&addr, &code, 2).await;
    let event: LobbyEvent = recv(&mut l1).await;
    assert!(matches!(event, LobbyEvent::StateSync { .. }));
}

async fn ws_garbage(ws: &mut Ws) {
    ws.send(Message::text(r#"{"type":"NO_SUCH","data":{}}"#))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_leave_shrinks_membership_and_last_leave_closes_lobby() {
    let addr = start_server().await;
    let code = create_lobby(&addr, "u1").await;
    let mut l1 = join_lobby(&addr, &code, 1).await;
    let l2 = join_lobby(&addr, &code, 2).await;
    let _: LobbyEvent = recv(&mut l1).await; // u2's join

    drop(l2);
    let event: LobbyEvent = recv(&mut l1).await;
    let LobbyEvent::StateSync { users, .. } = event else {
        panic!("expected STATE_SYNC, got {event:?}");
    };
    assert_eq!(users, vec![LobbyUser::new("u1", "player-1")]);

    // Last member leaves; the code stops resolving.
    drop(l1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut ws = connect(&addr, &format!("/lobby/{}", code.as_str())).await;
    send(&mut ws, &join_event(9)).await;
    assert_server_closed(&mut ws).await;
}

#[tokio::test]
async fn test_start_lobby_requires_two_members() {
    let addr = start_server().await;
    let code = create_lobby(&addr, "u1").await;
    let mut l1 = join_lobby(&addr, &code, 1).await;

    send(&mut l1, &LobbyEvent::StartLobby { user_id: "u1".into() }).await;

    // The start fails and the owner is told the event was invalid.
    let event: LobbyEvent = recv(&mut l1).await;
    assert_eq!(event, LobbyEvent::invalid_event());
}

#[tokio::test]
async fn test_start_lobby_ignores_non_owner() {
    let addr = start_server().await;
    let code = create_lobby(&addr, "u1").await;
    let mut l1 = join_lobby(&addr, &code, 1).await;
    let mut l2 = join_lobby(&addr, &code, 2).await;
    let _: LobbyEvent = recv(&mut l1).await;

    // Non-owner start: silently dropped.
    send(&mut l2, &LobbyEvent::StartLobby { user_id: "u2".into() }).await;
    // Owner start: goes through. The first thing either member sees is
    // the owner's LOBBY_STARTING, proving u2's request did nothing.
    send(&mut l1, &LobbyEvent::StartLobby { user_id: "u1".into() }).await;

    for ws in [&mut l1, &mut l2] {
        let event: LobbyEvent = recv(ws).await;
        assert!(
            matches!(event, LobbyEvent::LobbyStarting { starting: true, .. }),
            "expected LOBBY_STARTING, got {event:?}"
        );
    }
}

// =========================================================================
// Game scope
// =========================================================================

#[tokio::test]
async fn test_unknown_game_code_gets_unauthorized() {
    let addr = start_server().await;
    let mut ws = connect(&addr, "/game/NOSUCH").await;
    send(&mut ws, &GameEvent::UserConnected { user_id: "u1".into() }).await;

    let event: GameEvent = recv(&mut ws).await;
    assert_eq!(event, GameEvent::unauthorized());
    assert_server_closed(&mut ws).await;
}

#[tokio::test]
async fn test_unregistered_seat_gets_unauthorized() {
    let addr = start_server().await;
    let code = create_lobby(&addr, "u1").await;
    let mut l1 = join_lobby(&addr, &code, 1).await;
    let _l2 = join_lobby(&addr, &code, 2).await;
    let _: LobbyEvent = recv(&mut l1).await;
    send(&mut l1, &LobbyEvent::StartLobby { user_id: "u1".into() }).await;
    let event: LobbyEvent = recv(&mut l1).await;
    let LobbyEvent::LobbyStarting { code: game_code, .. } = event else {
        panic!("expected LOBBY_STARTING, got {event:?}");
    };

    let mut intruder = connect_game(&addr, &game_code, 9).await;
    let event: GameEvent = recv(&mut intruder).await;
    assert_eq!(event, GameEvent::unauthorized());
    assert_server_closed(&mut intruder).await;
}

#[tokio::test]
async fn test_full_game_to_win_closes_both_connections() {
    let addr = start_server().await;
    let (mut g_first, mut g_second, first, _second) = setup_started_game(&addr).await;

    // First player takes the top row while the second fills the middle.
    play(&mut g_first, &mut g_second, 0).await;
    play(&mut g_second, &mut g_first, 3).await;
    play(&mut g_first, &mut g_second, 1).await;
    play(&mut g_second, &mut g_first, 4).await;

    // Winning move: tile 2 completes [0, 1, 2]. The mover sees one sync
    // and the result; the opponent additionally sees the relay.
    send(&mut g_first, &GameEvent::UserTurn { tile_index: 2 }).await;
    let _: GameEvent = recv(&mut g_first).await; // GAME_SYNC
    let result: GameEvent = recv(&mut g_first).await;
    let GameEvent::Result(result) = result else {
        panic!("expected RESULT, got {result:?}");
    };
    assert!(result.is_over);
    assert_eq!(result.status, GameStatus::Ended);
    assert_eq!(result.winner.as_ref(), Some(&first));
    assert_eq!(result.combination, Some([0, 1, 2]));

    let relayed: GameEvent = recv(&mut g_second).await;
    assert_eq!(relayed, GameEvent::UserTurn { tile_index: 2 });
    let _: GameEvent = recv(&mut g_second).await; // GAME_SYNC
    let result: GameEvent = recv(&mut g_second).await;
    assert!(matches!(result, GameEvent::Result(_)));

    // The referee closes both connections from the server side.
    assert_server_closed(&mut g_first).await;
    assert_server_closed(&mut g_second).await;
}

#[tokio::test]
async fn test_full_game_to_tie_has_no_winner() {
    let addr = start_server().await;
    let (mut g_first, mut g_second, _first, _second) = setup_started_game(&addr).await;

    // F O F        (F = first mover's mark, O = opponent's)
    // F O O    — alternating fills that never complete a line.
    // O F F
    play(&mut g_first, &mut g_second, 0).await;
    play(&mut g_second, &mut g_first, 1).await;
    play(&mut g_first, &mut g_second, 2).await;
    play(&mut g_second, &mut g_first, 4).await;
    play(&mut g_first, &mut g_second, 3).await;
    play(&mut g_second, &mut g_first, 5).await;
    play(&mut g_first, &mut g_second, 8).await;
    play(&mut g_second, &mut g_first, 6).await;

    // Final tile fills the board with no line anywhere.
    send(&mut g_first, &GameEvent::UserTurn { tile_index: 7 }).await;
    let _: GameEvent = recv(&mut g_first).await;
    let result: GameEvent = recv(&mut g_first).await;
    let GameEvent::Result(result) = result else {
        panic!("expected RESULT, got {result:?}");
    };
    assert!(result.is_over);
    assert_eq!(result.winner, None);
    assert_eq!(result.combination, None);

    assert_server_closed(&mut g_first).await;
}

#[tokio::test]
async fn test_out_of_turn_move_is_silently_ignored() {
    let addr = start_server().await;
    let (mut g_first, mut g_second, _first, _second) = setup_started_game(&addr).await;

    // The non-current seat tries to move first: nothing comes back and
    // nothing is relayed.
    send(&mut g_second, &GameEvent::UserTurn { tile_index: 0 }).await;

    // The rightful seat then takes the same tile, proving the board was
    // untouched.
    send(&mut g_first, &GameEvent::UserTurn { tile_index: 0 }).await;
    let sync: GameEvent = recv(&mut g_first).await;
    let GameEvent::GameSync { board, .. } = sync else {
        panic!("expected GAME_SYNC, got {sync:?}");
    };
    assert!(!board[0].is_empty());

    let relayed: GameEvent = recv(&mut g_second).await;
    assert_eq!(relayed, GameEvent::UserTurn { tile_index: 0 });
}

#[tokio::test]
async fn test_mid_game_disconnect_notifies_survivor_and_reclaims() {
    let addr = start_server().await;
    let code = create_lobby(&addr, "u1").await;
    let mut l1 = join_lobby(&addr, &code, 1).await;
    let _l2 = join_lobby(&addr, &code, 2).await;
    let _: LobbyEvent = recv(&mut l1).await;
    send(&mut l1, &LobbyEvent::StartLobby { user_id: "u1".into() }).await;
    let event: LobbyEvent = recv(&mut l1).await;
    let LobbyEvent::LobbyStarting { code: game_code, .. } = event else {
        panic!("expected LOBBY_STARTING, got {event:?}");
    };

    let mut g1 = connect_game(&addr, &game_code, 1).await;
    let _: GameEvent = recv(&mut g1).await;
    let mut g2 = connect_game(&addr, &game_code, 2).await;
    for _ in 0..3 {
        let _: GameEvent = recv(&mut g1).await;
        let _: GameEvent = recv(&mut g2).await;
    }

    // Seat 2 vanishes mid-game.
    drop(g2);

    let event: GameEvent = recv(&mut g1).await;
    assert_eq!(event, GameEvent::user_disconnected());

    // The game was reclaimed: the code no longer admits anyone, so
    // there is no reconnecting into a dead session.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut again = connect_game(&addr, &game_code, 2).await;
    let event: GameEvent = recv(&mut again).await;
    assert_eq!(event, GameEvent::unauthorized());
}

#[tokio::test]
async fn test_malformed_game_event_is_fatal_for_the_session() {
    let addr = start_server().await;
    let (mut g_first, mut g_second, _first, _second) = setup_started_game(&addr).await;

    ws_garbage(&mut g_first).await;

    let event: GameEvent = recv(&mut g_first).await;
    assert_eq!(event, GameEvent::invalid_event());
    assert_server_closed(&mut g_first).await;

    // Terminating that connection is a disconnect for the session.
    let event: GameEvent = recv(&mut g_second).await;
    assert_eq!(event, GameEvent::user_disconnected());
}
