use serde_json::{Value, json};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use viper_web::{
    config::DoorbellConfig,
    doorbell::{self, DoorbellClient, ViperDoorbell},
    status_api::StatusApi,
    viper::{
        Unauthorized, ViperClient,
        command::{self, HEADER_LEN, buffer_length},
    },
};

#[derive(Clone, Copy)]
enum Behaviour {
    /// Answer commands like a real intercom accepting `response_code`
    Answer { response_code: u16 },
    /// Drop the connection after the first frame
    HangUp,
    /// Read frames but never answer
    Silent,
}

fn reply_for(request: &Value, response_code: u16) -> Value {
    let response_string = if response_code == 200 {
        "Access Granted"
    } else {
        "Access Denied"
    };

    match request["message"].as_str() {
        Some("access") => json!({
            "message": "access",
            "message-type": "response",
            "message-id": 1,
            "response-code": response_code,
            "response-string": response_string,
        }),
        Some("get-configuration") => json!({
            "message": "get-configuration",
            "message-type": "response",
            "message-id": 1,
            "response-code": 200,
            "vip": {
                "enabled": true,
                "apt-address": "SB000006",
                "apt-subaddress": 2,
                "user-parameters": {
                    "opendoor-address-book": [{"apt-address": "SB1000001"}]
                }
            }
        }),
        Some("server-info") => json!({
            "message": "server-info",
            "message-type": "response",
            "message-id": 1,
            "response-code": 200,
            "model": "MSVF",
            "version": "1.2.3",
        }),
        Some("activate-user") if response_code == 200 => json!({
            "message": "activate-user",
            "message-type": "response",
            "message-id": 1,
            "response-code": 200,
            "response-string": "Access Granted",
            "user-token": format!("token-for-{}", request["email"].as_str().unwrap_or("")),
        }),
        Some("activate-user") => json!({
            "message": "activate-user",
            "message-type": "response",
            "message-id": 1,
            "response-code": response_code,
            "response-string": response_string,
        }),
        Some("remove-all-users") => json!({
            "message": "remove-all-users",
            "message-type": "response",
            "message-id": 1,
            "response-code": 200,
            "response-string": "Success",
            "requester": request["requester"],
        }),
        _ => json!({"response-code": 400, "response-string": "Bad Request"}),
    }
}

async fn serve_connection(mut socket: TcpStream, behaviour: Behaviour) {
    loop {
        let mut head = [0; HEADER_LEN];
        if socket.read_exact(&mut head).await.is_err() {
            return;
        }
        let mut body = vec![0; buffer_length(head[2], head[3])];
        if socket.read_exact(&mut body).await.is_err() {
            return;
        }

        match behaviour {
            Behaviour::HangUp => return,
            Behaviour::Silent => continue,
            Behaviour::Answer { response_code } => {
                let reply = match serde_json::from_slice::<Value>(&body) {
                    Ok(request) => {
                        let response = reply_for(&request, response_code).to_string();
                        command::make(response.as_bytes(), &[head[4], head[5]]).unwrap()
                    }
                    // channel open and close frames are echoed back
                    Err(_) => [&head[..], &body[..]].concat(),
                };

                if socket.write_all(&reply).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn serve(listener: TcpListener, behaviour: Behaviour) {
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(serve_connection(socket, behaviour));
        }
    });
}

async fn start_mock_doorbell(behaviour: Behaviour) -> DoorbellConfig {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock doorbell");
    let addr = listener.local_addr().unwrap();
    serve(listener, behaviour);

    DoorbellConfig {
        ip: addr.ip().to_string(),
        port: addr.port(),
        token: "secret-token".to_string(),
    }
}

#[tokio::test]
async fn client_runs_commands_on_fresh_channels() {
    let config = start_mock_doorbell(Behaviour::Answer { response_code: 200 }).await;
    let mut client = ViperClient::connect(&config.address()).await.unwrap();

    let auth = client.authorize(&config.token).await.unwrap();
    assert_eq!(auth["response-code"], 200);

    let info = client.info().await.unwrap();
    assert_eq!(info["model"], "MSVF");

    let configuration = client.configuration("all").await.unwrap();
    assert_eq!(configuration["vip"]["apt-address"], "SB000006");

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn client_passes_through_error_responses() {
    let config = start_mock_doorbell(Behaviour::Answer { response_code: 200 }).await;
    let mut client = ViperClient::connect(&config.address()).await.unwrap();

    // face recognition is not scripted, the mock answers with a bad request
    let response = client.face_recognition_params().await.unwrap();
    assert_eq!(response["response-code"], 400);
}

#[tokio::test]
async fn doors_returns_vip_section() {
    let config = start_mock_doorbell(Behaviour::Answer { response_code: 200 }).await;
    let doorbell = ViperDoorbell::new(&config);

    let doors = doorbell.doors().await.expect("doors failed");
    assert_eq!(doors["apt-address"], "SB000006");
    assert_eq!(
        doors["user-parameters"]["opendoor-address-book"][0]["apt-address"],
        "SB1000001"
    );
}

#[tokio::test]
async fn doors_fails_with_unauthorized_on_refused_token() {
    let config = start_mock_doorbell(Behaviour::Answer { response_code: 403 }).await;
    let doorbell = ViperDoorbell::new(&config);

    let err = doorbell.doors().await.unwrap_err();
    let unauthorized = err
        .downcast_ref::<Unauthorized>()
        .expect("expected unauthorized error");
    assert_eq!(unauthorized.response["response-code"], 403);
}

#[tokio::test]
async fn doors_fails_when_doorbell_hangs_up() {
    let config = start_mock_doorbell(Behaviour::HangUp).await;
    let doorbell = ViperDoorbell::new(&config);

    let err = doorbell.doors().await.unwrap_err();
    assert!(err.downcast_ref::<Unauthorized>().is_none());
}

#[tokio::test]
async fn doors_times_out_on_silent_doorbell() {
    let config = start_mock_doorbell(Behaviour::Silent).await;
    let doorbell = ViperDoorbell::new(&config);

    let err = doorbell.doors().await.unwrap_err();
    assert!(format!("{err:#}").contains("timed out"));
}

#[tokio::test]
async fn doorbell_serves_as_status_api() {
    let config = start_mock_doorbell(Behaviour::Answer { response_code: 200 }).await;
    let doorbell = ViperDoorbell::new(&config);

    assert!(doorbell.poll().await.unwrap().available);
    let doors = doorbell.list_doors().await.unwrap();
    assert_eq!(doors.0["apt-subaddress"], 2);
}

#[tokio::test]
async fn doorbell_reports_unavailable_when_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let doorbell = ViperDoorbell::new(&DoorbellConfig {
        ip: addr.ip().to_string(),
        port: addr.port(),
        token: "secret-token".to_string(),
    });

    assert!(!doorbell.available().await);
    assert!(!doorbell.poll().await.unwrap().available);
    assert!(doorbell.doors().await.is_err());
}

#[tokio::test]
async fn client_manages_users() {
    let config = start_mock_doorbell(Behaviour::Answer { response_code: 200 }).await;
    let mut client = ViperClient::connect(&config.address()).await.unwrap();

    let sign_up = client.sign_up("me@example.com").await.unwrap();
    assert_eq!(sign_up["user-token"], "token-for-me@example.com");

    let removed = client.remove_all_users("admin").await.unwrap();
    assert_eq!(removed["response-code"], 200);
    assert_eq!(removed["requester"], "admin");

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn sign_up_returns_user_token() {
    let config = start_mock_doorbell(Behaviour::Answer { response_code: 200 }).await;

    let token = doorbell::sign_up(
        &config.address(),
        "me@example.com",
        Duration::from_millis(50),
    )
    .await
    .expect("sign up failed");
    assert_eq!(token, "token-for-me@example.com");
}

#[tokio::test]
async fn sign_up_fails_when_refused() {
    let config = start_mock_doorbell(Behaviour::Answer { response_code: 403 }).await;

    let err = doorbell::sign_up(
        &config.address(),
        "me@example.com",
        Duration::from_millis(50),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("403"));
}

#[tokio::test]
async fn sign_up_waits_for_doorbell() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let listener = TcpListener::bind(addr)
            .await
            .expect("failed to rebind mock doorbell");
        serve(listener, Behaviour::Answer { response_code: 200 });
    });

    let token = tokio::time::timeout(
        Duration::from_secs(5),
        doorbell::sign_up(&addr.to_string(), "late@example.com", Duration::from_millis(50)),
    )
    .await
    .expect("sign up did not finish")
    .expect("sign up failed");
    assert_eq!(token, "token-for-late@example.com");
}
