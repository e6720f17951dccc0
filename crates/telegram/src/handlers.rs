use {
    teloxide::types::{Chat, MediaKind, Message, MessageKind, User},
    tracing::{debug, error, info},
};

use {
    courier_channels::{ChatRef, TextFormat, UserId},
    courier_pairing::{PairingOutcome, Role, UnlinkOutcome},
    courier_routing::{InboundMessage, RelayOutcome},
    courier_store::LinkRecord,
};

use crate::{
    access::AccessDenied,
    commands::{Command, help_text, parse_command},
    state::BotContext,
};

pub(crate) const START_MSG: &str = "Hello 🤗! I collect tagged requests from linked chats and forward them where they belong 😉. /help";
pub(crate) const NOT_ADMIN_MSG: &str = "Hmm, you're not an admin here 😒. I want to talk to a boss 👑";
pub(crate) const PRIVATE_CHAT_MSG: &str = "This command only works in groups and channels.";
pub(crate) const NEEDS_USER_MSG: &str = "I can't tell who sent this. Run the command from your own account, or post !request_channel in a channel.";
pub(crate) const SAME_CHAT_MSG: &str =
    "Both ends of a link must be different chats. Run the other command in another chat.";
pub(crate) const NOT_LINKED_MSG: &str = "No link is configured for this chat.";
pub(crate) const NOTHING_TO_CLAIM_MSG: &str =
    "Nothing to link yet: run /request_source in the chat to watch first.";
pub(crate) const FAILURE_MSG: &str = "⚠️ Something went wrong, please try again later.";

/// Who speaks for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Author {
    User(UserId),
    /// The chat itself: a channel post or an anonymous group admin.
    Chat,
    Unknown,
}

/// Handle a single inbound message or channel post.
///
/// Internal errors are logged and answered with a generic reply.
pub async fn handle_message(ctx: &BotContext, msg: Message) {
    let chat_id = msg.chat.id.0;
    if let Err(e) = dispatch(ctx, &msg).await {
        error!(chat_id, error = %e, "error handling telegram message");
        reply(ctx, chat_id, FAILURE_MSG).await;
    }
}

async fn dispatch(ctx: &BotContext, msg: &Message) -> anyhow::Result<()> {
    if let Some(text) = msg.text() {
        if let Some(command) = parse_command(text, ctx.bot_username.as_deref()) {
            return handle_command(ctx, msg, command).await;
        }
        if msg.chat.is_channel() && has_prefix(text, &ctx.auto_claim_prefix) {
            return handle_auto_claim(ctx, msg).await;
        }
    }
    relay(ctx, msg).await
}

async fn handle_command(ctx: &BotContext, msg: &Message, command: Command) -> anyhow::Result<()> {
    let chat_id = msg.chat.id.0;
    debug!(chat_id, command = command.name(), "telegram command");

    if !command.is_privileged() {
        let text = match command {
            Command::Help => help_text(),
            _ => START_MSG.to_string(),
        };
        reply(ctx, chat_id, &text).await;
        return Ok(());
    }

    let author = match authorize(ctx, msg).await? {
        Ok(author) => author,
        Err(denied) => {
            info!(chat_id, command = command.name(), %denied, "command rejected");
            match denied {
                AccessDenied::NotAdmin => reply(ctx, chat_id, NOT_ADMIN_MSG).await,
                AccessDenied::PrivateChat => reply(ctx, chat_id, PRIVATE_CHAT_MSG).await,
                AccessDenied::UnknownSender => {},
            }
            return Ok(());
        },
    };

    let chat = chat_ref(&msg.chat);
    match command {
        Command::QgGroup => {
            ctx.coordinator.links().set_oversight(&chat).await?;
            reply(
                ctx,
                chat_id,
                &format!("✅ {} is now the oversight group.", chat.title),
            )
            .await;
        },
        Command::RequestSource => begin_pairing(ctx, author, chat, Role::Request).await?,
        Command::RequestChannel => begin_pairing(ctx, author, chat, Role::Collect).await?,
        Command::DeleteLink => match ctx.coordinator.unlink(chat_id).await? {
            UnlinkOutcome::Removed { .. } => reply(ctx, chat_id, "🗑 Link removed.").await,
            UnlinkOutcome::NotConfigured => reply(ctx, chat_id, NOT_LINKED_MSG).await,
        },
        Command::Start | Command::Help => {},
    }
    Ok(())
}

/// Admin check for privileged commands. Posts made as the chat itself are
/// admin-only on Telegram and skip the lookup.
async fn authorize(
    ctx: &BotContext,
    msg: &Message,
) -> anyhow::Result<Result<Author, AccessDenied>> {
    if msg.chat.is_private() {
        return Ok(Err(AccessDenied::PrivateChat));
    }
    match author(msg) {
        Author::Chat => Ok(Ok(Author::Chat)),
        Author::User(user) => {
            if ctx.admins.is_admin(msg.chat.id.0, user).await? {
                Ok(Ok(Author::User(user)))
            } else {
                Ok(Err(AccessDenied::NotAdmin))
            }
        },
        Author::Unknown => Ok(Err(AccessDenied::UnknownSender)),
    }
}

async fn begin_pairing(
    ctx: &BotContext,
    author: Author,
    chat: ChatRef,
    role: Role,
) -> anyhow::Result<()> {
    let chat_id = chat.id;
    let Author::User(user) = author else {
        reply(ctx, chat_id, NEEDS_USER_MSG).await;
        return Ok(());
    };
    let outcome = match role {
        Role::Request => ctx.coordinator.begin_as_request(user, chat).await?,
        Role::Collect => ctx.coordinator.begin_as_collector(user, chat).await?,
    };
    match outcome {
        PairingOutcome::AwaitingPeer { role } => {
            reply(ctx, chat_id, awaiting_peer_text(role)).await;
        },
        PairingOutcome::Completed { record, .. } => {
            reply(ctx, chat_id, &linked_text(&record)).await;
        },
        PairingOutcome::SameChat => reply(ctx, chat_id, SAME_CHAT_MSG).await,
        PairingOutcome::Dropped | PairingOutcome::NothingToClaim => {
            debug!(chat_id, user_id = %user, ?outcome, "pairing step produced no reply");
        },
    }
    Ok(())
}

async fn handle_auto_claim(ctx: &BotContext, msg: &Message) -> anyhow::Result<()> {
    let chat_id = msg.chat.id.0;
    if msg.forward_origin().is_some() || msg.is_automatic_forward() {
        debug!(chat_id, "ignoring forwarded auto-claim post");
        return Ok(());
    }
    match ctx.coordinator.auto_claim(chat_ref(&msg.chat)).await? {
        PairingOutcome::Completed { record, .. } => {
            reply(ctx, chat_id, &linked_text(&record)).await;
        },
        PairingOutcome::NothingToClaim => reply(ctx, chat_id, NOTHING_TO_CLAIM_MSG).await,
        other => debug!(chat_id, ?other, "unexpected auto-claim outcome"),
    }
    Ok(())
}

async fn relay(ctx: &BotContext, msg: &Message) -> anyhow::Result<()> {
    let inbound = inbound_message(msg);
    match ctx.relay.handle(&inbound).await? {
        RelayOutcome::Ignored(reason) => {
            debug!(chat_id = inbound.chat_id, ?reason, "message not relayed");
        },
        RelayOutcome::Forwarded { to, outcome } => {
            debug!(chat_id = inbound.chat_id, to, sent = outcome.is_sent(), "message relayed");
        },
    }
    Ok(())
}

async fn reply(ctx: &BotContext, chat_id: i64, text: &str) {
    ctx.outbound
        .send_text(chat_id, text, TextFormat::Plain)
        .await;
}

fn awaiting_peer_text(role: Role) -> &'static str {
    match role {
        Role::Request => {
            "📝 Request source saved. Now run /request_channel in the chat that should receive the requests."
        },
        Role::Collect => {
            "📝 Collect chat saved. Now run /request_source in the chat whose requests should be collected."
        },
    }
}

fn linked_text(record: &LinkRecord) -> String {
    format!(
        "🔗 Linked: requests from {} now go to {}.",
        record.request_title,
        record.collect_title.as_deref().unwrap_or("?")
    )
}

/// Case-insensitive prefix match, ignoring leading whitespace.
fn has_prefix(text: &str, prefix: &str) -> bool {
    text.trim_start()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn author(msg: &Message) -> Author {
    if msg.chat.is_channel() || msg.sender_chat.as_ref().is_some_and(|c| c.id == msg.chat.id) {
        return Author::Chat;
    }
    match msg.from.as_ref() {
        Some(user) => Author::User(UserId(user.id.0)),
        None => Author::Unknown,
    }
}

fn chat_title(chat: &Chat) -> String {
    chat.title()
        .or_else(|| chat.first_name())
        .map(str::to_owned)
        .or_else(|| chat.username().map(|u| format!("@{u}")))
        .unwrap_or_else(|| chat.id.0.to_string())
}

fn chat_ref(chat: &Chat) -> ChatRef {
    ChatRef::new(chat.id.0, chat_title(chat))
}

fn user_label(user: &User) -> String {
    let last = user.last_name.as_deref().unwrap_or("");
    let name = format!("{} {last}", user.first_name).trim().to_string();
    match (name.is_empty(), user.username.as_deref()) {
        (false, Some(username)) => format!("{name} (@{username})"),
        (true, Some(username)) => format!("@{username}"),
        (false, None) => name,
        (true, None) => user.id.0.to_string(),
    }
}

/// Display attribution for a relayed message.
fn sender_label(msg: &Message) -> String {
    if let Some(chat) = msg.sender_chat.as_ref() {
        let title = chat_title(chat);
        return match msg.author_signature() {
            Some(signature) => format!("{title} ({signature})"),
            None => title,
        };
    }
    msg.from
        .as_ref()
        .map(user_label)
        .unwrap_or_else(|| "Unknown sender".to_string())
}

/// Reduce a Telegram message to what the relay looks at.
fn inbound_message(msg: &Message) -> InboundMessage {
    let (text, caption, photo) = match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => (Some(t.text.clone()), None, None),
            MediaKind::Photo(p) => (
                None,
                p.caption.clone(),
                p.photo.last().map(|ps| ps.file.id.to_string()),
            ),
            _ => (None, None, None),
        },
        _ => (None, None, None),
    };
    InboundMessage {
        chat_id: msg.chat.id.0,
        sender: sender_label(msg),
        text,
        caption,
        photo,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        courier_channels::{
            AdminDirectory, ChatOutbound, Error as ChannelError, Result as ChannelResult,
            SendOutcome,
        },
        courier_config::CourierConfig,
        courier_store::ConfigStore,
        rstest::rstest,
        serde_json::{Value, json},
        std::sync::{Arc, Mutex},
    };

    const ALICE: u64 = 7;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Sent {
        Text { to: i64, text: String },
        Photo { to: i64, photo: String, caption: String },
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<Sent>>,
    }

    impl Recorder {
        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn texts_to(&self, chat_id: i64) -> Vec<String> {
            self.sent()
                .into_iter()
                .filter_map(|s| match s {
                    Sent::Text { to, text } if to == chat_id => Some(text),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl ChatOutbound for Recorder {
        async fn send_text(&self, to: i64, text: &str, _format: TextFormat) -> SendOutcome {
            self.sent.lock().unwrap().push(Sent::Text {
                to,
                text: text.to_string(),
            });
            SendOutcome::Sent
        }

        async fn send_photo(&self, to: i64, photo: &str, caption: &str) -> SendOutcome {
            self.sent.lock().unwrap().push(Sent::Photo {
                to,
                photo: photo.to_string(),
                caption: caption.to_string(),
            });
            SendOutcome::Sent
        }
    }

    struct FakeAdmins {
        admins: Vec<u64>,
        fail: bool,
    }

    #[async_trait]
    impl AdminDirectory for FakeAdmins {
        async fn is_admin(&self, _chat_id: i64, user: UserId) -> ChannelResult<bool> {
            if self.fail {
                return Err(ChannelError::invalid_input("lookup failed"));
            }
            Ok(self.admins.contains(&user.0))
        }
    }

    struct Fixture {
        ctx: BotContext,
        outbound: Arc<Recorder>,
        store: Arc<ConfigStore>,
    }

    fn fixture_with(admins: &[u64], fail: bool) -> Fixture {
        let config = CourierConfig::default();
        let store = Arc::new(ConfigStore::memory());
        let outbound = Arc::new(Recorder::default());
        let ctx = BotContext::new(
            Some("courier_bot".into()),
            &config,
            Arc::clone(&store),
            Arc::clone(&outbound) as Arc<dyn ChatOutbound>,
            Arc::new(FakeAdmins {
                admins: admins.to_vec(),
                fail,
            }),
        );
        Fixture {
            ctx,
            outbound,
            store,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(&[ALICE], false)
    }

    fn alice() -> Value {
        json!({ "id": ALICE, "is_bot": false, "first_name": "Alice", "username": "alice" })
    }

    fn group_message(chat_id: i64, title: &str, from: Value, text: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": chat_id, "type": "group", "title": title },
            "from": from,
            "text": text
        }))
        .expect("deserialize group message")
    }

    fn channel_post(chat_id: i64, title: &str, extra: Value) -> Message {
        let mut post = json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": chat_id, "type": "channel", "title": title },
            "sender_chat": { "id": chat_id, "type": "channel", "title": title }
        });
        if let (Some(post), Value::Object(extra)) = (post.as_object_mut(), extra) {
            post.extend(extra);
        }
        serde_json::from_value(post).expect("deserialize channel post")
    }

    async fn seed_provisional(store: &ConfigStore, chat_id: i64, title: &str) {
        store
            .update(|doc| doc.upsert(LinkRecord::provisional(&ChatRef::new(chat_id, title))))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn start_works_in_private_chat() {
        let fx = fixture();
        let msg: Message = serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": alice(),
            "text": "/start"
        }))
        .unwrap();

        handle_message(&fx.ctx, msg).await;

        assert_eq!(fx.outbound.texts_to(42), vec![START_MSG.to_string()]);
    }

    #[tokio::test]
    async fn privileged_command_rejected_in_private_chat() {
        let fx = fixture();
        let msg: Message = serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": alice(),
            "text": "/qg_group"
        }))
        .unwrap();

        handle_message(&fx.ctx, msg).await;

        assert_eq!(fx.outbound.texts_to(42), vec![PRIVATE_CHAT_MSG.to_string()]);
        assert!(fx.store.snapshot().await.unwrap().qg.is_none());
    }

    #[tokio::test]
    async fn non_admin_is_rejected_without_state_change() {
        let fx = fixture_with(&[], false);

        handle_message(&fx.ctx, group_message(-5, "QG", alice(), "/qg_group")).await;
        handle_message(&fx.ctx, group_message(-100, "Zone1", alice(), "/request_source")).await;

        assert_eq!(fx.outbound.texts_to(-5), vec![NOT_ADMIN_MSG.to_string()]);
        assert_eq!(fx.outbound.texts_to(-100), vec![NOT_ADMIN_MSG.to_string()]);
        let doc = fx.store.snapshot().await.unwrap();
        assert!(doc.qg.is_none());
        assert!(doc.links.is_empty());
    }

    #[tokio::test]
    async fn admin_registers_oversight_group() {
        let fx = fixture();

        handle_message(&fx.ctx, group_message(-5, "QG", alice(), "/qg_group@courier_bot")).await;

        let doc = fx.store.snapshot().await.unwrap();
        assert_eq!(doc.qg.unwrap().chat_id(), Some(-5));
        assert_eq!(fx.outbound.texts_to(-5), vec![
            "✅ QG is now the oversight group.".to_string()
        ]);
    }

    #[tokio::test]
    async fn two_commands_link_chats_and_relay_follows() {
        let fx = fixture();

        handle_message(&fx.ctx, group_message(-100, "Zone1", alice(), "/request_source")).await;
        let doc = fx.store.snapshot().await.unwrap();
        assert!(!doc.link(-100).unwrap().is_complete());
        assert_eq!(fx.outbound.texts_to(-100), vec![
            awaiting_peer_text(Role::Request).to_string()
        ]);

        handle_message(&fx.ctx, group_message(-200, "Collect1", alice(), "/request_channel")).await;
        let doc = fx.store.snapshot().await.unwrap();
        let record = doc.link(-100).unwrap();
        assert_eq!(record.collect_chat_id(), Some(-200));
        assert_eq!(fx.outbound.texts_to(-200), vec![
            "🔗 Linked: requests from Zone1 now go to Collect1.".to_string()
        ]);

        handle_message(
            &fx.ctx,
            group_message(-100, "Zone1", alice(), "Need this #req urgently"),
        )
        .await;
        assert_eq!(
            fx.outbound.texts_to(-200).last().map(String::as_str),
            Some("📬 Alice (@alice) [Zone1] : urgently")
        );
    }

    #[tokio::test]
    async fn untagged_and_unlinked_messages_are_quiet() {
        let fx = fixture();
        seed_provisional(&fx.store, -100, "Zone1").await;

        handle_message(&fx.ctx, group_message(-100, "Zone1", alice(), "hello #req")).await;
        handle_message(&fx.ctx, group_message(-300, "Other", alice(), "hello #req")).await;
        handle_message(
            &fx.ctx,
            group_message(-100, "Zone1", alice(), "/request_source@other_bot"),
        )
        .await;

        assert!(fx.outbound.sent().is_empty());
    }

    #[tokio::test]
    async fn tagged_photo_is_relayed_by_largest_file_id() {
        let fx = fixture();
        fx.store
            .update(|doc| {
                doc.upsert(LinkRecord::complete(
                    &ChatRef::new(-100, "Zone1"),
                    &ChatRef::new(-200, "Collect1"),
                ));
            })
            .await
            .unwrap();
        let msg: Message = serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": -100, "type": "group", "title": "Zone1" },
            "from": alice(),
            "photo": [
                { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90 },
                { "file_id": "large", "file_unique_id": "l", "width": 800, "height": 800 }
            ],
            "caption": "#REQ broken pump"
        }))
        .unwrap();

        handle_message(&fx.ctx, msg).await;

        assert_eq!(fx.outbound.sent(), vec![Sent::Photo {
            to: -200,
            photo: "large".into(),
            caption: "📬 Alice (@alice) [Zone1] : broken pump".into(),
        }]);
    }

    #[tokio::test]
    async fn channel_post_claims_pending_link() {
        let fx = fixture_with(&[], false);
        seed_provisional(&fx.store, -100, "Zone1").await;

        handle_message(
            &fx.ctx,
            channel_post(-1009, "Collect1", json!({ "text": "!Request_Channel" })),
        )
        .await;

        let doc = fx.store.snapshot().await.unwrap();
        assert_eq!(doc.link(-100).unwrap().collect_chat_id(), Some(-1009));
        assert_eq!(fx.outbound.texts_to(-1009), vec![
            "🔗 Linked: requests from Zone1 now go to Collect1.".to_string()
        ]);
    }

    #[tokio::test]
    async fn forwarded_claim_post_is_ignored() {
        let fx = fixture();
        seed_provisional(&fx.store, -100, "Zone1").await;

        handle_message(
            &fx.ctx,
            channel_post(
                -1009,
                "Collect1",
                json!({
                    "text": "!request_channel",
                    "forward_origin": { "type": "hidden_user", "date": 1, "sender_user_name": "Someone" }
                }),
            ),
        )
        .await;

        let doc = fx.store.snapshot().await.unwrap();
        assert!(!doc.link(-100).unwrap().is_complete());
        assert!(fx.outbound.sent().is_empty());
    }

    #[tokio::test]
    async fn claim_with_nothing_pending_says_so() {
        let fx = fixture();

        handle_message(
            &fx.ctx,
            channel_post(-1009, "Collect1", json!({ "text": "!request_channel" })),
        )
        .await;

        assert_eq!(fx.outbound.texts_to(-1009), vec![NOTHING_TO_CLAIM_MSG.to_string()]);
    }

    #[tokio::test]
    async fn pairing_command_in_channel_needs_a_user() {
        let fx = fixture();

        handle_message(
            &fx.ctx,
            channel_post(-1009, "Collect1", json!({ "text": "/request_channel" })),
        )
        .await;

        assert_eq!(fx.outbound.texts_to(-1009), vec![NEEDS_USER_MSG.to_string()]);
    }

    #[tokio::test]
    async fn delete_link_reports_missing_and_removes_existing() {
        let fx = fixture();

        handle_message(&fx.ctx, group_message(-100, "Zone1", alice(), "/delete_link")).await;
        assert_eq!(fx.outbound.texts_to(-100), vec![NOT_LINKED_MSG.to_string()]);

        seed_provisional(&fx.store, -100, "Zone1").await;
        seed_provisional(&fx.store, -101, "Zone2").await;
        handle_message(&fx.ctx, group_message(-100, "Zone1", alice(), "/delete_link")).await;

        let doc = fx.store.snapshot().await.unwrap();
        assert!(doc.link(-100).is_none());
        assert!(doc.link(-101).is_some());
        assert_eq!(
            fx.outbound.texts_to(-100).last().map(String::as_str),
            Some("🗑 Link removed.")
        );
    }

    #[tokio::test]
    async fn internal_error_gets_generic_reply() {
        let fx = fixture_with(&[ALICE], true);

        handle_message(&fx.ctx, group_message(-5, "QG", alice(), "/qg_group")).await;

        assert_eq!(fx.outbound.texts_to(-5), vec![FAILURE_MSG.to_string()]);
    }

    #[rstest]
    #[case(json!({ "id": 1, "is_bot": false, "first_name": "Alice", "last_name": "Doe", "username": "ad" }), "Alice Doe (@ad)")]
    #[case(json!({ "id": 1, "is_bot": false, "first_name": "Alice" }), "Alice")]
    #[case(json!({ "id": 1, "is_bot": false, "first_name": "", "username": "ad" }), "@ad")]
    #[case(json!({ "id": 99, "is_bot": false, "first_name": "" }), "99")]
    fn user_labels(#[case] user: Value, #[case] expected: &str) {
        let user: User = serde_json::from_value(user).unwrap();
        assert_eq!(user_label(&user), expected);
    }

    #[test]
    fn channel_sender_includes_signature() {
        let post = channel_post(
            -1009,
            "News",
            json!({ "text": "hi", "author_signature": "Bob" }),
        );
        assert_eq!(sender_label(&post), "News (Bob)");
    }

    #[rstest]
    #[case("!request_channel", true)]
    #[case("  !REQUEST_CHANNEL please", true)]
    #[case("!request", false)]
    #[case("request_channel", false)]
    #[case("ü", false)]
    fn prefix_matching(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(has_prefix(text, "!request_channel"), expected);
    }
}
