//! Static label tables for the tags and media kinds SublerCLI understands.
//!
//! Every wire label lives here and nowhere else. The `tags!` table also
//! generates one chainable helper per tag on [`Atoms`], so adding a row adds
//! both the enumeration entry and its helper.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::atoms::Atoms;

macro_rules! tags {
    ($($variant:ident => $method:ident, $label:literal;)*) => {
        /// Metadata tags recognised by SublerCLI.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Tag {
            $($variant,)*
        }

        impl Tag {
            pub const ALL: &'static [Tag] = &[$(Tag::$variant,)*];

            /// Label as the tool spells it inside `-metadata`.
            pub fn label(self) -> &'static str {
                match self {
                    $(Tag::$variant => $label,)*
                }
            }
        }

        impl Atoms {
            $(
                #[doc = concat!("Appends a `", $label, "` atom.")]
                pub fn $method(self, value: impl Into<String>) -> Self {
                    self.add(Tag::$variant, value)
                }
            )*
        }
    };
}

tags! {
    Name => name, "Name";
    Artist => artist, "Artist";
    AlbumArtist => album_artist, "Album Artist";
    Album => album, "Album";
    Grouping => grouping, "Grouping";
    Composer => composer, "Composer";
    Comments => comments, "Comments";
    Genre => genre, "Genre";
    ReleaseDate => release_date, "Release Date";
    TrackNumber => track_number, "Track #";
    DiskNumber => disk_number, "Disk #";
    Tempo => tempo, "Tempo";
    TvShow => tv_show, "TV Show";
    TvEpisodeNumber => tv_episode_number, "TV Episode #";
    TvNetwork => tv_network, "TV Network";
    TvEpisodeId => tv_episode_id, "TV Episode ID";
    TvSeason => tv_season, "TV Season";
    Description => description, "Description";
    LongDescription => long_description, "Long Description";
    SeriesDescription => series_description, "Series Description";
    Rating => rating, "Rating";
    RatingAnnotation => rating_annotation, "Rating Annotation";
    Studio => studio, "Studio";
    Cast => cast, "Cast";
    Director => director, "Director";
    Codirector => codirector, "Codirector";
    Producers => producers, "Producers";
    Screenwriters => screenwriters, "Screenwriters";
    Lyrics => lyrics, "Lyrics";
    Copyright => copyright, "Copyright";
    EncodingTool => encoding_tool, "Encoding Tool";
    EncodedBy => encoded_by, "Encoded By";
    Keywords => keywords, "Keywords";
    Category => category, "Category";
    ContentId => content_id, "contentID";
    ArtistId => artist_id, "artistID";
    PlaylistId => playlist_id, "playlistID";
    GenreId => genre_id, "genreID";
    ComposerId => composer_id, "composerID";
    Xid => xid, "XID";
    ITunesAccount => itunes_account, "iTunes Account";
    ITunesAccountType => itunes_account_type, "iTunes Account Type";
    ITunesCountry => itunes_country, "iTunes Country";
    TrackSubTitle => track_sub_title, "Track Sub-Title";
    SongDescription => song_description, "Song Description";
    ArtDirector => art_director, "Art Director";
    Arranger => arranger, "Arranger";
    Lyricist => lyricist, "Lyricist";
    Acknowledgement => acknowledgement, "Acknowledgement";
    Conductor => conductor, "Conductor";
    LinearNotes => linear_notes, "Linear Notes";
    RecordCompany => record_company, "Record Company";
    OriginalArtist => original_artist, "Original Artist";
    PhonogramRights => phonogram_rights, "Phonogram Rights";
    Producer => producer, "Producer";
    Performer => performer, "Performer";
    Publisher => publisher, "Publisher";
    SoundEngineer => sound_engineer, "Sound Engineer";
    Soloist => soloist, "Soloist";
    Credits => credits, "Credits";
    Thanks => thanks, "Thanks";
    OnlineExtras => online_extras, "Online Extras";
    ExecutiveProducer => executive_producer, "Executive Producer";
    SortName => sort_name, "Sort Name";
    SortArtist => sort_artist, "Sort Artist";
    SortAlbumArtist => sort_album_artist, "Sort Album Artist";
    SortAlbum => sort_album, "Sort Album";
    SortComposer => sort_composer, "Sort Composer";
    SortTvShow => sort_tv_show, "Sort TV Show";
    Artwork => artwork, "Artwork";
    HdVideo => hd_video, "HD Video";
    Gapless => gapless, "Gapless";
    ContentRating => content_rating, "Content Rating";
    MediaKind => media_kind, "Media Kind";
}

impl Tag {
    /// Every recognised label, in table order.
    pub fn labels() -> Vec<&'static str> {
        Tag::ALL.iter().map(|tag| tag.label()).collect()
    }

    /// Exact, case-sensitive lookup; the tool matches labels verbatim.
    pub fn from_label(label: &str) -> Option<Tag> {
        Tag::ALL.iter().copied().find(|tag| tag.label() == label)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        self.label()
    }
}

/// iTunes media kind classification, written as a `Media Kind` atom.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MediaKind {
    Music,
    Audiobook,
    MusicVideo,
    #[default]
    Movie,
    TvShow,
    Booklet,
    Ringtone,
    Podcast,
    ITunesU,
    HomeVideo,
}

impl MediaKind {
    pub const ALL: &'static [MediaKind] = &[
        MediaKind::Music,
        MediaKind::Audiobook,
        MediaKind::MusicVideo,
        MediaKind::Movie,
        MediaKind::TvShow,
        MediaKind::Booklet,
        MediaKind::Ringtone,
        MediaKind::Podcast,
        MediaKind::ITunesU,
        MediaKind::HomeVideo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Music => "Music",
            MediaKind::Audiobook => "Audiobook",
            MediaKind::MusicVideo => "Music Video",
            MediaKind::Movie => "Movie",
            MediaKind::TvShow => "TV Show",
            MediaKind::Booklet => "Booklet",
            MediaKind::Ringtone => "Ringtone",
            MediaKind::Podcast => "Podcast",
            MediaKind::ITunesU => "iTunes U",
            MediaKind::HomeVideo => "Home Video",
        }
    }

    pub fn labels() -> Vec<&'static str> {
        MediaKind::ALL.iter().map(|kind| kind.label()).collect()
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<MediaKind> for String {
    fn from(kind: MediaKind) -> Self {
        kind.label().to_string()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown media kind '{0}'")]
pub struct ParseMediaKindError(pub String);

/// Accepts the wire label in any case, ignoring spaces, `-` and `_`, so
/// `TV Show`, `tv-show` and `tvshow` all parse.
impl FromStr for MediaKind {
    type Err = ParseMediaKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = fold(value);
        MediaKind::ALL
            .iter()
            .copied()
            .find(|kind| fold(kind.label()) == wanted)
            .ok_or_else(|| ParseMediaKindError(value.to_string()))
    }
}

fn fold(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
