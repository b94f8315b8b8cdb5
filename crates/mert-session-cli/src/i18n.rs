/*
[INPUT]:  Message keys, locale selection, session events
[OUTPUT]: Localized user-facing text
[POS]:    Presentation layer - typed translations
[UPDATE]: When adding messages or locales (the match must stay exhaustive)
*/

use std::fmt;
use std::str::FromStr;

use mert_session_adapter::SessionEvent;
use mert_session_adapter::session::{DegradedReason, SignOutReason};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Tr,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Tr, Locale::En];

    pub fn code(self) -> &'static str {
        match self {
            Locale::Tr => "tr",
            Locale::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tr" => Ok(Locale::Tr),
            "en" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    SignInStarted,
    SignedIn,
    SessionRestored,
    SignatureRejected,
    WalletUnavailable,
    BackendRejected,
    BackendUnavailable,
    NoTokenIssued,
    LoggedOut,
    WalletDisconnected,
    SessionExpired,
    NotLoggedIn,
    AddressOnlySession,
    PrivateKeyRequired,
    AdminRequired,
    ProfileRefreshed,
    BuySuccess,
    SellSuccess,
    ActionDone,
    ConfigValid,
    StatusUnauthenticated,
    StatusAuthenticating,
    StatusVerified,
    StatusAddressOnly,
    StoredSession,
    NoStoredSession,
}

impl MessageKey {
    pub fn text(self, locale: Locale) -> &'static str {
        match locale {
            Locale::Tr => self.tr(),
            Locale::En => self.en(),
        }
    }

    fn tr(self) -> &'static str {
        match self {
            MessageKey::SignInStarted => "Cüzdanınızda imza isteğini onaylayın",
            MessageKey::SignedIn => "Cüzdan bağlandı",
            MessageKey::SessionRestored => "Oturum geri yüklendi",
            MessageKey::SignatureRejected => "İmza reddedildi, yalnızca adres ile devam ediliyor",
            MessageKey::WalletUnavailable => "Cüzdan imza atamıyor, yalnızca adres ile devam ediliyor",
            MessageKey::BackendRejected => "Sunucu imzayı kabul etmedi",
            MessageKey::BackendUnavailable => "Sunucuya ulaşılamadı",
            MessageKey::NoTokenIssued => "Sunucu oturum anahtarı vermedi",
            MessageKey::LoggedOut => "Çıkış yapıldı",
            MessageKey::WalletDisconnected => "Cüzdan bağlantısı kesildi",
            MessageKey::SessionExpired => "Oturum süresi doldu, lütfen tekrar giriş yapın",
            MessageKey::NotLoggedIn => "Giriş yapılmadı",
            MessageKey::AddressOnlySession => "Oturum doğrulanmadı, korumalı işlemler kullanılamaz",
            MessageKey::PrivateKeyRequired => "Bu komut için --private-key veya MERT_PRIVATE_KEY gerekli",
            MessageKey::AdminRequired => "Bu işlem için yönetici yetkisi gerekli",
            MessageKey::ProfileRefreshed => "Profil güncellendi",
            MessageKey::BuySuccess => "Satın alma başarılı",
            MessageKey::SellSuccess => "Satış başarılı",
            MessageKey::ActionDone => "İşlem tamamlandı",
            MessageKey::ConfigValid => "Yapılandırma geçerli",
            MessageKey::StatusUnauthenticated => "oturum yok",
            MessageKey::StatusAuthenticating => "imza bekleniyor",
            MessageKey::StatusVerified => "doğrulanmış oturum",
            MessageKey::StatusAddressOnly => "yalnızca adres",
            MessageKey::StoredSession => "Kayıtlı oturum",
            MessageKey::NoStoredSession => "Kayıtlı oturum yok",
        }
    }

    fn en(self) -> &'static str {
        match self {
            MessageKey::SignInStarted => "Approve the signature request in your wallet",
            MessageKey::SignedIn => "Wallet connected",
            MessageKey::SessionRestored => "Session restored",
            MessageKey::SignatureRejected => "Signature declined, continuing with address only",
            MessageKey::WalletUnavailable => "Wallet cannot sign, continuing with address only",
            MessageKey::BackendRejected => "The server rejected the signature",
            MessageKey::BackendUnavailable => "The server could not be reached",
            MessageKey::NoTokenIssued => "The server issued no session token",
            MessageKey::LoggedOut => "Logged out",
            MessageKey::WalletDisconnected => "Wallet disconnected",
            MessageKey::SessionExpired => "Session expired, please log in again",
            MessageKey::NotLoggedIn => "Not logged in",
            MessageKey::AddressOnlySession => "Session is not verified, protected actions are unavailable",
            MessageKey::PrivateKeyRequired => "This command needs --private-key or MERT_PRIVATE_KEY",
            MessageKey::AdminRequired => "This action requires admin rights",
            MessageKey::ProfileRefreshed => "Profile refreshed",
            MessageKey::BuySuccess => "Purchase successful",
            MessageKey::SellSuccess => "Sale successful",
            MessageKey::ActionDone => "Done",
            MessageKey::ConfigValid => "Configuration is valid",
            MessageKey::StatusUnauthenticated => "no session",
            MessageKey::StatusAuthenticating => "waiting for signature",
            MessageKey::StatusVerified => "verified session",
            MessageKey::StatusAddressOnly => "address only",
            MessageKey::StoredSession => "Stored session",
            MessageKey::NoStoredSession => "No stored session",
        }
    }
}

impl From<DegradedReason> for MessageKey {
    fn from(reason: DegradedReason) -> Self {
        match reason {
            DegradedReason::SignatureRejected => MessageKey::SignatureRejected,
            DegradedReason::WalletUnavailable => MessageKey::WalletUnavailable,
            DegradedReason::BackendRejected => MessageKey::BackendRejected,
            DegradedReason::BackendUnavailable => MessageKey::BackendUnavailable,
            DegradedReason::NoTokenIssued => MessageKey::NoTokenIssued,
        }
    }
}

/// Message shown for a controller notification
pub fn event_message(event: &SessionEvent) -> MessageKey {
    match event {
        SessionEvent::SignInStarted { .. } => MessageKey::SignInStarted,
        SessionEvent::SignedIn { restored: true, .. } => MessageKey::SessionRestored,
        SessionEvent::SignedIn { restored: false, .. } => MessageKey::SignedIn,
        SessionEvent::Degraded { reason, .. } => MessageKey::from(*reason),
        SessionEvent::SignedOut { reason } => match reason {
            SignOutReason::Logout => MessageKey::LoggedOut,
            SignOutReason::WalletDisconnected => MessageKey::WalletDisconnected,
            SignOutReason::Unauthorized => MessageKey::SessionExpired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parsing() {
        assert_eq!("TR".parse::<Locale>().unwrap(), Locale::Tr);
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());
        assert_eq!(Locale::default(), Locale::Tr);
    }

    #[test]
    fn test_every_locale_has_text() {
        for locale in Locale::ALL {
            assert!(!MessageKey::SessionExpired.text(locale).is_empty());
        }
        assert_eq!(MessageKey::LoggedOut.text(Locale::Tr), "Çıkış yapıldı");
        assert_eq!(MessageKey::LoggedOut.text(Locale::En), "Logged out");
    }

    #[test]
    fn test_event_messages() {
        let restored = SessionEvent::SignedIn {
            address: "0xabc".to_string(),
            restored: true,
        };
        assert_eq!(event_message(&restored), MessageKey::SessionRestored);

        let degraded = SessionEvent::Degraded {
            address: "0xabc".to_string(),
            reason: DegradedReason::SignatureRejected,
        };
        assert_eq!(event_message(&degraded), MessageKey::SignatureRejected);

        let expired = SessionEvent::SignedOut {
            reason: SignOutReason::Unauthorized,
        };
        assert_eq!(event_message(&expired), MessageKey::SessionExpired);
    }
}
