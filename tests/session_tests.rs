mod test_utils;

use rosident::proto::session::{challenge_response, Session};
use rosident::{Credential, ResolveError};
use std::net::IpAddr;
use std::time::Duration;
use test_utils::{send_sentence, tag_of, write_chunked, SentenceReader};
use tokio::net::TcpListener;

const CONNECT: Duration = Duration::from_secs(2);
const COMMAND: Duration = Duration::from_secs(2);

fn cred() -> Credential {
    Credential::new("admin", "secret", "test")
}

async fn listen() -> (TcpListener, IpAddr, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr.ip(), addr.port())
}

#[test]
fn challenge_response_matches_known_vector() {
    let response = challenge_response("abc", "0102030405060708090a0b0c0d0e0f10").unwrap();
    assert_eq!(response, "002a4067c3ef5a9d79906f81d8af2f28bc");
}

#[test]
fn challenge_response_rejects_bad_hex() {
    let err = challenge_response("abc", "not-hex").unwrap_err();
    assert!(matches!(err, ResolveError::AuthError(_)));
}

#[tokio::test]
async fn plain_login_then_identity() {
    let (listener, ip, port) = listen().await;
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut reader = SentenceReader::new();

        let login = reader.next(&mut stream).await;
        assert!(login.contains(&"/login".to_string()));
        assert!(login.contains(&"=name=admin".to_string()));
        assert!(login.contains(&"=password=secret".to_string()));
        let tag = tag_of(&login);
        send_sentence(&mut stream, &["!done", &format!(".tag={tag}")]).await;

        let cmd = reader.next(&mut stream).await;
        assert!(cmd.contains(&"/system/identity/print".to_string()));
        let tag = tag_of(&cmd);
        send_sentence(&mut stream, &["!re", "=name=lab-gateway", &format!(".tag={tag}")]).await;
        send_sentence(&mut stream, &["!done", &format!(".tag={tag}")]).await;
    });

    let session = Session::connect(ip, port, &cred(), CONNECT, COMMAND)
        .await
        .unwrap();
    let identity = session.system_identity().await.unwrap();
    assert_eq!(identity.as_deref(), Some("lab-gateway"));
    session.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn falls_back_to_challenge_login_on_trap() {
    const CHALLENGE: &str = "00112233445566778899aabbccddeeff";
    let (listener, ip, port) = listen().await;
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut reader = SentenceReader::new();

        // plain attempt is refused
        let plain = reader.next(&mut stream).await;
        assert!(plain.contains(&"=password=secret".to_string()));
        let tag = tag_of(&plain);
        send_sentence(
            &mut stream,
            &["!trap", "=message=invalid user name or password", &format!(".tag={tag}")],
        )
        .await;

        // bare /login opens the legacy flow with a challenge on the !done
        let bare = reader.next(&mut stream).await;
        assert!(bare.contains(&"/login".to_string()));
        assert!(!bare.iter().any(|w| w.starts_with("=password=")));
        let tag = tag_of(&bare);
        send_sentence(
            &mut stream,
            &["!done", &format!("=ret={CHALLENGE}"), &format!(".tag={tag}")],
        )
        .await;

        let proof = reader.next(&mut stream).await;
        let expected = challenge_response("secret", CHALLENGE).unwrap();
        assert!(proof.contains(&format!("=response={expected}")));
        let tag = tag_of(&proof);
        send_sentence(&mut stream, &["!done", &format!(".tag={tag}")]).await;

        let cmd = reader.next(&mut stream).await;
        let tag = tag_of(&cmd);
        send_sentence(&mut stream, &["!re", "=name=legacy-box", &format!(".tag={tag}")]).await;
        send_sentence(&mut stream, &["!done", &format!(".tag={tag}")]).await;
    });

    let session = Session::connect(ip, port, &cred(), CONNECT, COMMAND)
        .await
        .unwrap();
    let identity = session.system_identity().await.unwrap();
    assert_eq!(identity.as_deref(), Some("legacy-box"));
    session.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn trap_on_both_login_phases_is_an_auth_error() {
    let (listener, ip, port) = listen().await;
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut reader = SentenceReader::new();
        for _ in 0..2 {
            let login = reader.next(&mut stream).await;
            let tag = tag_of(&login);
            send_sentence(
                &mut stream,
                &["!trap", "=message=invalid user name or password", &format!(".tag={tag}")],
            )
            .await;
        }
    });

    let err = Session::connect(ip, port, &cred(), CONNECT, COMMAND)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::AuthError(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn interleaved_replies_resolve_to_their_own_tags() {
    let (listener, ip, port) = listen().await;
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut reader = SentenceReader::new();

        let login = reader.next(&mut stream).await;
        let tag = tag_of(&login);
        send_sentence(&mut stream, &["!done", &format!(".tag={tag}")]).await;

        // two concurrent commands; map tags by the command word
        let mut iface_tag = None;
        let mut addr_tag = None;
        for _ in 0..2 {
            let cmd = reader.next(&mut stream).await;
            let tag = tag_of(&cmd);
            if cmd.contains(&"/interface/print".to_string()) {
                iface_tag = Some(tag);
            } else {
                addr_tag = Some(tag);
            }
        }
        let iface_tag = iface_tag.unwrap();
        let addr_tag = addr_tag.unwrap();

        // replies interleaved across tags, delivered in fragmented writes
        let mut bytes = Vec::new();
        bytes.extend(rosident::proto::codec::encode_sentence(&[
            "!re",
            "=name=ether1",
            &format!(".tag={iface_tag}"),
        ]));
        bytes.extend(rosident::proto::codec::encode_sentence(&[
            "!re",
            "=address=10.0.0.1/24",
            &format!(".tag={addr_tag}"),
        ]));
        bytes.extend(rosident::proto::codec::encode_sentence(&[
            "!done",
            &format!(".tag={addr_tag}"),
        ]));
        bytes.extend(rosident::proto::codec::encode_sentence(&[
            "!done",
            &format!(".tag={iface_tag}"),
        ]));
        write_chunked(&mut stream, &bytes, 3).await;
    });

    let session = Session::connect(ip, port, &cred(), CONNECT, COMMAND)
        .await
        .unwrap();
    let (interfaces, addresses) = tokio::join!(
        session.send_command(&["/interface/print"]),
        session.send_command(&["/ip/address/print"])
    );
    let interfaces = interfaces.unwrap();
    let addresses = addresses.unwrap();

    assert_eq!(interfaces.attr("name"), Some("ether1"));
    assert_eq!(interfaces.attr("address"), None);
    assert_eq!(addresses.attr("address"), Some("10.0.0.1/24"));
    assert_eq!(addresses.attr("name"), None);

    session.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn replies_for_unknown_tags_are_dropped() {
    let (listener, ip, port) = listen().await;
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut reader = SentenceReader::new();

        let login = reader.next(&mut stream).await;
        let tag = tag_of(&login);
        send_sentence(&mut stream, &["!done", &format!(".tag={tag}")]).await;

        let cmd = reader.next(&mut stream).await;
        let tag = tag_of(&cmd);
        // stray reply first; nobody is waiting on tag 999
        send_sentence(&mut stream, &["!done", "=name=ghost", ".tag=999"]).await;
        send_sentence(&mut stream, &["!re", "=name=real-router", &format!(".tag={tag}")]).await;
        send_sentence(&mut stream, &["!done", &format!(".tag={tag}")]).await;
    });

    let session = Session::connect(ip, port, &cred(), CONNECT, COMMAND)
        .await
        .unwrap();
    let identity = session.system_identity().await.unwrap();
    assert_eq!(identity.as_deref(), Some("real-router"));
    session.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn silent_peer_times_out_the_command_not_the_session() {
    let (listener, ip, port) = listen().await;
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut reader = SentenceReader::new();

        let login = reader.next(&mut stream).await;
        let tag = tag_of(&login);
        send_sentence(&mut stream, &["!done", &format!(".tag={tag}")]).await;

        // swallow the command and say nothing
        let _ = reader.next(&mut stream).await;
        tokio::time::sleep(Duration::from_millis(600)).await;
    });

    let session = Session::connect(ip, port, &cred(), CONNECT, Duration::from_millis(200))
        .await
        .unwrap();
    let err = session.send_command(&["/system/identity/print"]).await.unwrap_err();
    assert!(matches!(err, ResolveError::CommandTimeout { .. }));
    session.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn disconnect_is_idempotent_and_fails_later_commands() {
    let (listener, ip, port) = listen().await;
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut reader = SentenceReader::new();
        let login = reader.next(&mut stream).await;
        let tag = tag_of(&login);
        send_sentence(&mut stream, &["!done", &format!(".tag={tag}")]).await;
    });

    let session = Session::connect(ip, port, &cred(), CONNECT, COMMAND)
        .await
        .unwrap();
    session.disconnect().await;
    session.disconnect().await;

    let err = session.send_command(&["/system/identity/print"]).await.unwrap_err();
    assert!(matches!(err, ResolveError::ConnectionError(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn connect_to_closed_port_is_a_connection_error() {
    // bind then drop to get a port with nothing listening
    let (listener, ip, port) = listen().await;
    drop(listener);

    let err = Session::connect(ip, port, &cred(), CONNECT, COMMAND)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::ConnectionError(_)));
}
