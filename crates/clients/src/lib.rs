mod consts;
mod poller;
mod telegram;

pub use consts::*;
pub use poller::UpdatePoller;
pub use telegram::{
    ApiResponse, Chat, ChatInviteLink, ChatMember, ChatMemberUpdated, InlineKeyboardButton,
    InlineKeyboardMarkup, ResponseParameters, TelegramBot, TelegramClient, TelegramError, TelegramUser, Update,
};
