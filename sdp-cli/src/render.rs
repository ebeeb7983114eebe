//! Console text for disks, timers and volumes.

use std::{fmt::Display, io};

use sdp_disklist::VolumeInfo;
use sdp_scsi::{FormFactor, PowerCondition, PowerTimers, UnitInfo, unit::RPM_NON_ROTATING};

pub const INDENT: &str = "    ";
pub const VOLUME_INDENT: &str = "         ";

const CAUTION: &str = "CAUTION: Improper usage may cause MAJOR DAMAGE to DATA/DEVICES!";
const HEADER: &str = "ID: FF   RPM   CAP  BS   Vendor   Product          Rev  Serial";
const TIMER_HEADER: &str = "    Cond:Current/Mask(Hex)/Default ...";
const SPLITTER: &str = "--------------------------------------------------------------";

const SI_SUFFIX: &[u8] = b" KMGTPEZY";

/// Three significant digits and an SI suffix, e.g. `512 `, `4K`, `8T`.
///
/// Values past the suffix table read `OVER`.
pub fn short_size(mut n: u64) -> String {
    let mut i = 0;
    while n >= 1000 {
        n /= 1000;
        i += 1;
    }
    match SI_SUFFIX.get(i) {
        Some(&s) => format!("{n}{}", s as char),
        None => "OVER".to_string(),
    }
}

pub fn rpm(rpm: u16) -> String {
    match rpm {
        RPM_NON_ROTATING => "SSD".to_string(),
        0x401..=0xFFFE => rpm.to_string(),
        _ => "n/a".to_string(),
    }
}

pub const fn form_factor(f: FormFactor) -> &'static str {
    match f {
        FormFactor::NotReported => "n/a",
        FormFactor::Inch5_25 => "5.25",
        FormFactor::Inch3_5 => "3.5",
        FormFactor::Inch2_5 => "2.5",
        FormFactor::Inch1_8 => "1.8",
        FormFactor::Below1_8 => "1.8-",
        FormFactor::Other => "oth",
    }
}

/// Everything after the `ID: ` column.
pub fn identity(info: &UnitInfo) -> String {
    format!(
        "{:<4} {:<5} {:<4} {:<4} {:<8} {:<16} {:<4} {}",
        form_factor(info.form_factor),
        rpm(info.rpm),
        short_size(info.capacity()),
        short_size(info.block_size.into()),
        info.vendor,
        info.product,
        info.revision,
        info.serial,
    )
}

/// `Letter:current/changeable/default` for each present condition, seconds except the hex mask.
pub fn timers(t: &PowerTimers) -> String {
    if t.presence.is_empty() {
        return "-".to_string();
    }

    t.presence
        .iter()
        .map(|c: PowerCondition| {
            let i = c.index();
            format!(
                "{}:{}/{:X}/{}",
                c.letter(),
                t.current[i] / 10,
                t.changeable[i],
                t.default[i] / 10
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Name and first mount point. Spanned volumes are highlighted and list their disks.
pub fn volume<V>(v: &VolumeInfo<V>) -> String {
    let mut line = if v.is_spanned() {
        console::style(&v.name).yellow().to_string()
    } else {
        v.name.clone()
    };

    if let Some(mp) = v.mount_points.first() {
        line.push_str(&format!(" \"{mp}\""));
    }

    if v.is_spanned() {
        let disks: Vec<_> = v.disks().iter().map(u32::to_string).collect();
        line.push_str(&format!(" Disks[{}]", disks.join(" ")));
    }

    line
}

pub fn write_banner(out: &mut impl io::Write) -> io::Result<()> {
    writeln!(out, "{}", console::style(CAUTION).white().bright().on_red())?;
    writeln!(
        out,
        "SDP SCSI Disk Power {}          {} License\n",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_LICENSE")
    )
}

pub fn write_header(out: &mut impl io::Write, with_timers: bool) -> io::Result<()> {
    writeln!(out, "{HEADER}")?;
    if with_timers {
        writeln!(out, "{TIMER_HEADER}")?;
    }
    writeln!(out, "{SPLITTER}")
}

/// Error text in reverse video on stderr.
pub fn write_error(err: &mut impl io::Write, msg: impl Display) -> io::Result<()> {
    writeln!(err, "{}", console::style(msg).reverse().for_stderr())
}

#[cfg(test)]
mod tests {
    use sdp_scsi::{PowerCondition, TimerMask};

    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(short_size(0), "0 ");
        assert_eq!(short_size(512), "512 ");
        assert_eq!(short_size(4096), "4K");
        assert_eq!(short_size(999_999), "999K");
        assert_eq!(short_size(8_001_563_222_016), "8T");
        assert_eq!(short_size(u64::MAX), "18E");
    }

    #[test]
    fn rpm_text() {
        assert_eq!(rpm(0), "n/a");
        assert_eq!(rpm(1), "SSD");
        assert_eq!(rpm(0x400), "n/a");
        assert_eq!(rpm(7200), "7200");
        assert_eq!(rpm(0xFFFF), "n/a");
    }

    #[test]
    fn identity_columns() {
        let info = UnitInfo {
            block_size: 512,
            block_count: 7_814_037_168,
            vendor: "ATA".into(),
            product: "WDC WD40EFRX-68N".into(),
            revision: "0A82".into(),
            serial: "WD-WCC7K0123456".into(),
            form_factor: FormFactor::Inch3_5,
            rpm: 5400,
            ..Default::default()
        };
        assert_eq!(
            identity(&info),
            "3.5  5400  4T   512  ATA      WDC WD40EFRX-68N 0A82 WD-WCC7K0123456"
        );
    }

    #[test]
    fn timer_row() {
        let mut t = PowerTimers::default();
        assert_eq!(timers(&t), "-");

        t.presence = [PowerCondition::IdleA, PowerCondition::StandbyZ]
            .into_iter()
            .collect::<TimerMask>();
        t.current[PowerCondition::IdleA.index()] = 1000;
        t.changeable[PowerCondition::IdleA.index()] = 0xFFFF_FFFF;
        t.default[PowerCondition::IdleA.index()] = 20;
        t.current[PowerCondition::StandbyZ.index()] = 72_000;
        t.changeable[PowerCondition::StandbyZ.index()] = 0xFFFF;
        t.default[PowerCondition::StandbyZ.index()] = 9000;
        assert_eq!(timers(&t), "A:100/FFFFFFFF/2 Z:7200/FFFF/900");
    }

    #[test]
    fn volumes() {
        let simple = VolumeInfo::new((), "/dev/sda1", vec!["/boot".into(), "/b".into()], [0]);
        assert_eq!(volume(&simple), "/dev/sda1 \"/boot\"");

        let bare = VolumeInfo::new((), "/dev/sda2", Vec::new(), [0]);
        assert_eq!(volume(&bare), "/dev/sda2");

        let spanned = VolumeInfo::new((), "/dev/md0", vec!["/srv".into()], [0, 2, 0]);
        assert_eq!(
            console::strip_ansi_codes(&volume(&spanned)),
            "/dev/md0 \"/srv\" Disks[0 2]"
        );
    }

    #[test]
    fn header() {
        let mut out = Vec::new();
        write_header(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("ID: FF"));
    }
}
