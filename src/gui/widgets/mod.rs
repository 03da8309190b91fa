use iced::{
    Color, Element, Theme, border,
    widget::{column, container, container::Style, row, text},
};
use iced_widget::container::bordered_box;

/// Where the user is in the open, detect, review cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    #[default]
    SelectImage,
    ImageLoaded,
    Detecting,
    Reviewed,
}

impl Stage {
    const ALL: [(Stage, &'static str); 4] = [
        (Stage::SelectImage, "Select image"),
        (Stage::ImageLoaded, "Image loaded"),
        (Stage::Detecting, "Detecting"),
        (Stage::Reviewed, "Review result"),
    ];

    fn style(self, other: Self) -> impl Fn(&Theme) -> Style {
        move |theme: &Theme| {
            let style = bordered_box(theme).border(border::width(5));
            // reached stages get a darker background
            if self >= other {
                let [r, g, b, _] = theme.palette().background.into_rgba8();
                style.background(Color::from_rgb8(r / 2, g / 2, b / 2))
            } else {
                style.background(theme.palette().background)
            }
        }
    }
}

pub fn layout<'a, Message>(
    sidebar: impl Into<Element<'a, Message>>,
    main_content: impl Into<Element<'a, Message>>,
    stage: Stage,
) -> Element<'a, Message>
where
    Message: 'a,
{
    let stages = Stage::ALL.iter().fold(column![], |col, (s, name)| {
        col.push(container(text(*name)).style(stage.style(*s)).padding(10))
    });

    container(row![
        container(column![
            container(stages),
            container(sidebar.into()).height(iced::Length::Fill),
        ])
        .width(iced::Length::FillPortion(1)),
        container(main_content.into())
            .width(iced::Length::FillPortion(4))
            .padding(10),
    ])
    .center_x(iced::Length::Fill)
    .center_y(iced::Length::Fill)
    .into()
}
